use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use http::HeaderMap;

use crate::HttpcResult;
use crate::util::{parse_header_name, parse_header_value, read_unpoisoned, write_unpoisoned};

/// Normalizes an HTTP method name for per-method lookups. `"get"`,
/// `"Get"`, and `"GET"` all resolve to the same bucket.
pub(crate) fn method_key(method: &str) -> String {
    method.to_ascii_uppercase()
}

/// A single username/password pair. Setting credentials for a method
/// replaces any earlier pair wholesale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    pub(crate) fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

/// Per-method request configuration: default headers, form fields, and
/// basic-auth credentials, keyed by normalized method name.
///
/// All reads return independent copies, so mutating a returned map never
/// touches the store. Reads on the request path take shared locks and may
/// run concurrently; writes are exclusive and visible to every build that
/// starts after the write returns.
#[derive(Debug, Default)]
pub struct ConfigStore {
    headers: RwLock<HashMap<String, HeaderMap>>,
    forms: RwLock<HashMap<String, BTreeMap<String, String>>>,
    basic_auth: RwLock<HashMap<String, BasicAuth>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a default header for `method`. The name and value are
    /// validated here so request assembly never has to re-check them.
    pub fn set_header(&self, method: &str, name: &str, value: &str) -> HttpcResult<()> {
        let name = parse_header_name(name)?;
        let value = parse_header_value(name.as_str(), value)?;
        write_unpoisoned(&self.headers)
            .entry(method_key(method))
            .or_default()
            .insert(name, value);
        Ok(())
    }

    /// Removes a default header. Deleting an absent entry is a no-op.
    pub fn delete_header(&self, method: &str, name: &str) {
        if let Some(entries) = write_unpoisoned(&self.headers).get_mut(&method_key(method)) {
            entries.remove(name);
        }
    }

    pub fn headers(&self, method: &str) -> HeaderMap {
        read_unpoisoned(&self.headers)
            .get(&method_key(method))
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_form_value(&self, method: &str, name: &str, value: &str) {
        write_unpoisoned(&self.forms)
            .entry(method_key(method))
            .or_default()
            .insert(name.to_owned(), value.to_owned());
    }

    pub fn delete_form_value(&self, method: &str, name: &str) {
        if let Some(entries) = write_unpoisoned(&self.forms).get_mut(&method_key(method)) {
            entries.remove(name);
        }
    }

    pub fn form_values(&self, method: &str) -> BTreeMap<String, String> {
        read_unpoisoned(&self.forms)
            .get(&method_key(method))
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_basic_auth(&self, method: &str, username: &str, password: &str) {
        write_unpoisoned(&self.basic_auth)
            .insert(method_key(method), BasicAuth::new(username, password));
    }

    pub fn basic_auth(&self, method: &str) -> Option<BasicAuth> {
        read_unpoisoned(&self.basic_auth)
            .get(&method_key(method))
            .cloned()
    }
}
