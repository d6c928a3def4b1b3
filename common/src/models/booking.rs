// common/src/models/booking.rs
use serde::{Deserialize, Serialize};

/// Values captured by the consultation booking form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingFields {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date: String,
    pub time: String,
    pub education_level: String,
    pub topic: String,
    /// Hidden field that humans never see; only bots fill it in
    pub honeypot: String,
}

impl BookingFields {
    /// Build from posted name/value pairs. Unknown names are ignored.
    pub fn from_form<I>(pairs: I, honeypot_field: &str) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut fields = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "name" => &mut fields.name,
                "email" => &mut fields.email,
                "phone" => &mut fields.phone,
                "date" => &mut fields.date,
                "time" => &mut fields.time,
                "education_level" => &mut fields.education_level,
                "topic" => &mut fields.topic,
                k if k == honeypot_field => &mut fields.honeypot,
                _ => continue,
            };
            *slot = value;
        }
        fields
    }

    /// Visible fields in form order, keyed by their form names. The honeypot is never included.
    pub fn visible_fields(&self) -> Vec<(String, String)> {
        [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("date", &self.date),
            ("time", &self.time),
            ("education_level", &self.education_level),
            ("topic", &self.topic),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.trim().to_string()))
        .collect()
    }

    /// Required fields that were left blank
    pub fn missing_required(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("date", &self.date),
            ("time", &self.time),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect()
    }
}
