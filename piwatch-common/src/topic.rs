/// Default topic prefix for published readings.
pub const TOPIC_PREFIX: &str = "sensor";

/// Builder for constructing Piwatch topics.
///
/// Topics follow the pattern `<prefix>/<reading>`, e.g. `sensor/cpu_temp`
/// or `rpi/sensor/uptime`.
#[derive(Debug, Clone)]
pub struct TopicBuilder {
    prefix: String,
}

impl TopicBuilder {
    /// Create a builder with the default prefix.
    pub fn new() -> Self {
        Self {
            prefix: TOPIC_PREFIX.to_string(),
        }
    }

    /// Create a builder with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Get the prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Build a topic for a reading.
    ///
    /// # Example
    /// ```
    /// use piwatch_common::topic::TopicBuilder;
    ///
    /// let builder = TopicBuilder::with_prefix("rpi/sensor");
    /// assert_eq!(builder.build("cpu_temp"), "rpi/sensor/cpu_temp");
    /// ```
    pub fn build(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            self.prefix.clone()
        } else {
            format!("{}/{}", self.prefix, suffix)
        }
    }

    /// Build a multi-level wildcard filter covering all topics under the prefix.
    ///
    /// # Example
    /// ```
    /// use piwatch_common::topic::TopicBuilder;
    ///
    /// let builder = TopicBuilder::with_prefix("esp32");
    /// assert_eq!(builder.wildcard(), "esp32/#");
    /// ```
    pub fn wildcard(&self) -> String {
        format!("{}/#", self.prefix)
    }

    /// Build the status topic for a bridge publishing under this prefix.
    ///
    /// # Example
    /// ```
    /// use piwatch_common::topic::TopicBuilder;
    ///
    /// let builder = TopicBuilder::with_prefix("sensor");
    /// assert_eq!(builder.status_topic(), "sensor/status");
    /// ```
    pub fn status_topic(&self) -> String {
        format!("{}/status", self.prefix)
    }
}

impl Default for TopicBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Check whether a topic matches a subscription filter.
///
/// Implements MQTT wildcard semantics: `+` matches exactly one level,
/// a trailing `#` matches any number of levels (including the parent
/// level itself), and everything else matches literally. Filters
/// beginning with a wildcard do not match `$`-prefixed topics.
///
/// # Example
/// ```
/// use piwatch_common::topic::matches;
///
/// assert!(matches("esp32/#", "esp32/livingroom/temp"));
/// assert!(matches("esp32/+/temp", "esp32/livingroom/temp"));
/// assert!(!matches("esp32/#", "esp8266/temp"));
/// ```
pub fn matches(filter: &str, topic: &str) -> bool {
    if filter.is_empty() || topic.is_empty() {
        return false;
    }

    // Broker-internal topics are not matched by leading wildcards.
    if topic.starts_with('$') && (filter.starts_with('+') || filter.starts_with('#')) {
        return false;
    }

    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(level), Some(name)) if level == name => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// Check whether a string is a valid subscription filter.
///
/// `#` may only appear alone as the final level; `+` may only appear
/// alone within a level.
pub fn is_valid_filter(filter: &str) -> bool {
    if filter.is_empty() {
        return false;
    }

    let levels: Vec<&str> = filter.split('/').collect();
    let last = levels.len() - 1;

    for (i, level) in levels.iter().enumerate() {
        if level.contains('#') && (*level != "#" || i != last) {
            return false;
        }
        if level.contains('+') && *level != "+" {
            return false;
        }
    }

    true
}

/// Check whether a string is a valid topic to publish to (no wildcards).
pub fn is_valid_topic(topic: &str) -> bool {
    !topic.is_empty() && !topic.contains('+') && !topic.contains('#')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_builder() {
        let builder = TopicBuilder::new();
        assert_eq!(builder.build("cpu_temp"), "sensor/cpu_temp");
        assert_eq!(builder.build(""), "sensor");
        assert_eq!(builder.wildcard(), "sensor/#");
        assert_eq!(builder.status_topic(), "sensor/status");

        let builder = TopicBuilder::with_prefix("rpi/sensor");
        assert_eq!(builder.build("memory"), "rpi/sensor/memory");
    }

    #[test]
    fn test_matches_literal() {
        assert!(matches("sensor/cpu_temp", "sensor/cpu_temp"));
        assert!(!matches("sensor/cpu_temp", "sensor/memory"));
        assert!(!matches("sensor/cpu_temp", "sensor/cpu_temp/extra"));
        assert!(!matches("sensor/cpu_temp/extra", "sensor/cpu_temp"));
    }

    #[test]
    fn test_matches_multi_level_wildcard() {
        assert!(matches("esp32/#", "esp32/temp"));
        assert!(matches("esp32/#", "esp32/livingroom/temp"));
        assert!(matches("esp32/#", "esp32"));
        assert!(matches("#", "anything/at/all"));
        assert!(!matches("esp32/#", "esp8266/temp"));
    }

    #[test]
    fn test_matches_single_level_wildcard() {
        assert!(matches("esp32/+/temp", "esp32/livingroom/temp"));
        assert!(!matches("esp32/+/temp", "esp32/temp"));
        assert!(!matches("esp32/+/temp", "esp32/a/b/temp"));
        assert!(matches("+/status", "sensor/status"));
    }

    #[test]
    fn test_matches_dollar_topics() {
        assert!(!matches("#", "$SYS/broker/uptime"));
        assert!(!matches("+/broker/uptime", "$SYS/broker/uptime"));
        assert!(matches("$SYS/#", "$SYS/broker/uptime"));
    }

    #[test]
    fn test_filter_validation() {
        assert!(is_valid_filter("esp32/#"));
        assert!(is_valid_filter("#"));
        assert!(is_valid_filter("esp32/+/temp"));
        assert!(!is_valid_filter("esp32/#/temp"));
        assert!(!is_valid_filter("esp32/temp#"));
        assert!(!is_valid_filter("esp32/te+mp"));
        assert!(!is_valid_filter(""));
    }

    #[test]
    fn test_topic_validation() {
        assert!(is_valid_topic("sensor/cpu_temp"));
        assert!(!is_valid_topic("sensor/#"));
        assert!(!is_valid_topic("sensor/+"));
        assert!(!is_valid_topic(""));
    }
}
