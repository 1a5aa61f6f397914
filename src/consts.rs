pub const GUPSHUP_BASE_URL: &str = "https://api.gupshup.io";
pub const GUPSHUP_CHANNEL: &str = "whatsapp";

pub const AMO_CONTACT_PHONE_FIELD_CODE: &str = "PHONE";
pub const AMO_CONTACT_PHONE_ENUM_CODE: &str = "WORK";
pub const AMO_NOTE_TYPE_COMMON: &str = "common";

pub const DOMESTIC_TRUNK_PREFIX: char = '8';
pub const COUNTRY_CODE_DIGIT: char = '7';

pub const DEFAULT_LEAD_PRICE: i64 = 0;
