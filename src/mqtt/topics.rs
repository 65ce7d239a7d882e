use crate::config::DeviceIdentity;

/// Topic names used by one device
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceTopics {
    /// Property report topic the telemetry is published on
    pub property_post: String,
    /// Custom topic the device listens on for commands
    pub control: String,
}

impl DeviceTopics {
    pub fn for_device(identity: &DeviceIdentity) -> Self {
        Self {
            property_post: format!(
                "/sys/{}/{}/thing/event/property/post",
                identity.product_key, identity.device_name
            ),
            control: format!(
                "/{}/{}/user/control",
                identity.product_key, identity.device_name
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("pk", "dn", "/sys/pk/dn/thing/event/property/post", "/pk/dn/user/control" ; "short names")]
    #[test_case("a1B2c3D4e5F", "sensor-01", "/sys/a1B2c3D4e5F/sensor-01/thing/event/property/post", "/a1B2c3D4e5F/sensor-01/user/control" ; "console style names")]
    fn topics_follow_templates(product_key: &str, device_name: &str, post: &str, control: &str) {
        let identity = DeviceIdentity {
            product_key: product_key.to_string(),
            device_name: device_name.to_string(),
            ..DeviceIdentity::default()
        };
        let topics = DeviceTopics::for_device(&identity);
        assert_eq!(topics.property_post, post);
        assert_eq!(topics.control, control);
    }
}
