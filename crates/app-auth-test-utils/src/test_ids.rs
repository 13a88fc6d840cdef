//! Fixed test IDs for deterministic tests

// Integration configuration ids
pub const TEST_CONFIG_ID: &str = "mockConfigId";
pub const TEST_CONFIG_ID_OTHER: &str = "otherConfigId";

// Application ids registered for the config ids above
pub const TEST_APP_ID: &str = "mockAppId";
pub const TEST_APP_ID_OTHER: &str = "otherAppId";

// Integration type reported by the integration resolver
pub const TEST_INTEGRATION_TYPE: &str = "jiraWebHookIntegration";

// Tokens
pub const TEST_SESSION_TOKEN: &str = "mockSessionToken";
pub const TEST_APP_TOKEN: &str = "mockAppToken";
pub const TEST_SYMPHONY_TOKEN: &str = "mockSymphonyToken";

// JWT claims
pub const TEST_USER_ID: i64 = 12345;
pub const TEST_AUDIENCE: &str = "www.symphony.com";
pub const TEST_ISSUER: &str = "Symphony Communication Services LLC.";

// Pod identity
pub const TEST_POD_ID: &str = "111";
pub const TEST_EXTERNAL_POD_ID: &str = "111";
pub const TEST_INVALID_POD_ID: &str = "0";

// Certificate cache duration in seconds
pub const TEST_CERT_CACHE_SECONDS: u64 = 60;
