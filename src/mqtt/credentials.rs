//! Derives the CONNECT identity (client id, username, password) for a device
//! and turns it into [`rumqttc::MqttOptions`].

use super::signer::{sign_hmac_sha1, ConnectParams};
use crate::config::{DeviceIdentity, MqttSettings};
use rand::Rng;
use rumqttc::MqttOptions;
use std::fmt;
use tracing::debug;

const CLIENT_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const CLIENT_ID_LEN: usize = 11;

/// Values placed into the CONNECT packet for one connection attempt
#[derive(Clone, PartialEq, Eq)]
pub struct MqttCredentials {
    pub client_id: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for MqttCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttCredentials")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Random lowercase base-36 string used as the session part of the client id
pub fn random_client_part<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CLIENT_ID_LEN)
        .map(|_| CLIENT_ID_ALPHABET[rng.gen_range(0..CLIENT_ID_ALPHABET.len())] as char)
        .collect()
}

impl MqttCredentials {
    /// Builds credentials from an explicit client part and timestamp
    pub fn with_client_part(identity: &DeviceIdentity, client_part: &str, timestamp_ms: i64) -> Self {
        let mut params = ConnectParams::new();
        params
            .insert("productKey", identity.product_key.as_str())
            .insert("deviceName", identity.device_name.as_str())
            .insert("timestamp", timestamp_ms)
            .insert("clientId", client_part);

        let password = sign_hmac_sha1(&params, &identity.device_secret);

        Self {
            client_id: format!(
                "{}|securemode=3,signmethod=hmacsha1,timestamp={}|",
                client_part, timestamp_ms
            ),
            username: format!("{}&{}", identity.device_name, identity.product_key),
            password,
        }
    }

    /// Draws a fresh client part from `rng` and signs it with `timestamp_ms`
    pub fn derive<R: Rng + ?Sized>(identity: &DeviceIdentity, rng: &mut R, timestamp_ms: i64) -> Self {
        let client_part = random_client_part(rng);
        let credentials = Self::with_client_part(identity, &client_part, timestamp_ms);
        debug!("Derived MQTT credentials: {:?}", credentials);
        credentials
    }

    /// CONNECT options for the device's regional broker
    pub fn mqtt_options(&self, identity: &DeviceIdentity, settings: &MqttSettings) -> MqttOptions {
        self.options_for_broker(identity.broker_host(), settings.port, settings)
    }

    /// CONNECT options for an explicit broker address
    pub fn options_for_broker(&self, host: String, port: u16, settings: &MqttSettings) -> MqttOptions {
        let mut options = MqttOptions::new(self.client_id.clone(), host, port);
        options
            .set_credentials(self.username.clone(), self.password.clone())
            .set_keep_alive(settings.keep_alive())
            .set_clean_session(settings.clean_session);
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn identity() -> DeviceIdentity {
        DeviceIdentity {
            product_key: "a1B2c3D4e5F".to_string(),
            device_name: "sensor-01".to_string(),
            device_secret: "0123456789abcdef".to_string(),
            region_id: "cn-shanghai".to_string(),
        }
    }

    #[test]
    fn credentials_follow_broker_format() {
        let creds = MqttCredentials::with_client_part(&identity(), "test", 1_700_000_000_000);
        assert_eq!(
            creds.client_id,
            "test|securemode=3,signmethod=hmacsha1,timestamp=1700000000000|"
        );
        assert_eq!(creds.username, "sensor-01&a1B2c3D4e5F");
        assert_eq!(creds.password, "bebe8a7b7d4b3a8d8d984741d24c7f92a3fac524");
    }

    #[test]
    fn client_part_is_lowercase_base36() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let part = random_client_part(&mut rng);
            assert_eq!(part.len(), CLIENT_ID_LEN);
            assert!(part
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn seeded_rng_reproduces_credentials() {
        let first = MqttCredentials::derive(&identity(), &mut StdRng::seed_from_u64(42), 1000);
        let second = MqttCredentials::derive(&identity(), &mut StdRng::seed_from_u64(42), 1000);
        assert_eq!(first, second);
    }

    #[test]
    fn options_carry_connect_parameters() {
        let creds = MqttCredentials::with_client_part(&identity(), "test", 1000);
        let options = creds.mqtt_options(&identity(), &MqttSettings::default());

        assert_eq!(
            options.broker_address(),
            ("a1B2c3D4e5F.iot-as-mqtt.cn-shanghai.aliyuncs.com".to_string(), 1883)
        );
        assert_eq!(options.client_id(), creds.client_id);
        assert_eq!(options.keep_alive(), Duration::from_secs(60));
        assert!(!options.clean_session());
        assert_eq!(
            options.credentials(),
            Some((creds.username.clone(), creds.password.clone()))
        );
    }

    #[test]
    fn debug_output_hides_password() {
        let creds = MqttCredentials::with_client_part(&identity(), "test", 1000);
        assert!(!format!("{:?}", creds).contains(&creds.password));
    }
}
