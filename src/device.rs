//! Host device information.

use crate::models::Properties;
use once_cell::sync::Lazy;
use regex::Regex;

const UNKNOWN: &str = "Unknown";

static MANUFACTURER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]+").expect("valid regex"));
static DEVICE_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9.,]+").expect("valid regex"));
static OS_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9]+\.[0-9]+(\.[0-9]+)?(\.[0-9]+)?").expect("valid regex")
});

/// Device the application runs on. Populated once when the client starts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Device {
    /// Unique device id. Computer name in most cases.
    pub id: String,
    /// Device model.
    pub model: String,
    /// Device manufacturer.
    pub oem_name: String,
    /// Operating system family, e.g. `Windows`, `MacOSX` or `Linux`.
    pub operating_system: String,
    /// Device type, e.g. `Desktop` or `Handheld`.
    pub device_type: String,
    /// Locale in `<language>-<REGION>` form, e.g. `en-US`. Empty if unknown.
    pub locale: String,
    /// Full operating system name and version.
    pub os_description: String,
}

impl Device {
    /// Query the host environment.
    pub fn detect() -> Self {
        let model = host_model().unwrap_or_else(|| UNKNOWN.into());
        Device {
            id: host_name().unwrap_or_else(|| UNKNOWN.into()),
            oem_name: manufacturer(&model),
            model,
            operating_system: operating_system_family().into(),
            device_type: device_type().into(),
            locale: locale_from_env().unwrap_or_default(),
            os_description: os_description(),
        }
    }

    /// Client properties derived from the device, attached to every envelope as custom tags.
    pub(crate) fn client_properties(&self, application_version: Option<&str>) -> Properties {
        let mut properties = Properties::new();
        if let Some(language) = self.locale.split('-').next().filter(|l| !l.is_empty()) {
            properties.insert("Language".into(), language.into());
        }
        properties.insert(
            "Platform".into(),
            format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
        );
        properties.insert("OS".into(), self.os_description.clone());
        properties.insert("OSVersion".into(), os_version(&self.os_description));
        properties.insert("DeviceVersion".into(), device_version(&self.model));
        if let Some(version) = application_version {
            properties.insert("Version".into(), version.into());
        }
        properties
    }
}

/// First alphabetic word of the model, or the model itself.
pub(crate) fn manufacturer(model: &str) -> String {
    first_match(&MANUFACTURER, model)
}

/// First run of digits, dots and commas in the model, or the model itself.
pub(crate) fn device_version(model: &str) -> String {
    first_match(&DEVICE_VERSION, model)
}

/// Dotted version number in the operating system description, or the description itself.
pub(crate) fn os_version(os: &str) -> String {
    first_match(&OS_VERSION, os)
}

fn first_match(re: &Regex, haystack: &str) -> String {
    re.find(haystack)
        .map(|m| m.as_str())
        .unwrap_or(haystack)
        .to_string()
}

fn operating_system_family() -> &'static str {
    match std::env::consts::OS {
        "windows" => "Windows",
        "macos" => "MacOSX",
        "linux" => "Linux",
        _ => "Other",
    }
}

fn device_type() -> &'static str {
    if cfg!(any(target_os = "android", target_os = "ios")) {
        "Handheld"
    } else {
        "Desktop"
    }
}

/// Parses POSIX locale variables such as `en_US.UTF-8` into `en-US`.
pub(crate) fn parse_locale(value: &str) -> Option<String> {
    let value = value.split(['.', '@']).next()?.trim();
    if value.is_empty() || value == "C" || value == "POSIX" {
        return None;
    }
    Some(value.replace('_', "-"))
}

fn locale_from_env() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find_map(|value| parse_locale(&value))
}

#[cfg(target_os = "linux")]
fn host_model() -> Option<String> {
    let read = |name: &str| {
        std::fs::read_to_string(format!("/sys/devices/virtual/dmi/id/{}", name))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    match (read("product_name"), read("sys_vendor")) {
        (Some(product), Some(vendor)) => Some(format!("{} ({})", product, vendor)),
        (product, vendor) => product.or(vendor),
    }
}

#[cfg(not(target_os = "linux"))]
fn host_model() -> Option<String> {
    None
}

#[cfg(feature = "device-info")]
fn host_name() -> Option<String> {
    sysinfo::System::host_name()
}

#[cfg(not(feature = "device-info"))]
fn host_name() -> Option<String> {
    ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok())
}

#[cfg(feature = "device-info")]
fn os_description() -> String {
    sysinfo::System::long_os_version()
        .or_else(|| {
            let name = sysinfo::System::name()?;
            Some(match sysinfo::System::os_version() {
                Some(version) => format!("{} {}", name, version),
                None => name,
            })
        })
        .unwrap_or_else(|| operating_system_family().into())
}

#[cfg(not(feature = "device-info"))]
fn os_description() -> String {
    operating_system_family().into()
}
