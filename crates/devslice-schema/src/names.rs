//! Name and identifier syntax rules.
//!
//! The `is_*` functions return human-readable problems with a bare string;
//! the `validate_*` functions attach a [`FieldPath`] and return an [`ErrorList`].

use crate::field::{ErrorList, FieldError, FieldPath};
use crate::limits::{
    DEVICE_MAX_DOMAIN_LENGTH, DEVICE_MAX_ID_LENGTH, DRIVER_NAME_MAX_LENGTH, POOL_NAME_MAX_LENGTH,
};
use crate::types::QualifiedName;
use regex::Regex;
use std::sync::LazyLock;

pub const DNS1123_LABEL_MAX_LENGTH: usize = 63;
pub const DNS1123_SUBDOMAIN_MAX_LENGTH: usize = 253;
pub const LABEL_VALUE_MAX_LENGTH: usize = 63;
const LABEL_KEY_NAME_MAX_LENGTH: usize = 63;

const DNS1123_LABEL_FMT: &str = "[a-z0-9]([-a-z0-9]*[a-z0-9])?";
const DNS1123_SUBDOMAIN_FMT: &str = r"[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*";
const C_IDENTIFIER_FMT: &str = "[A-Za-z_][A-Za-z0-9_]*";
const LABEL_VALUE_FMT: &str = "(([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9])?";
const QUALIFIED_NAME_FMT: &str = "([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]";

static DNS1123_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{DNS1123_LABEL_FMT}$")).expect("valid regex"));

static DNS1123_SUBDOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{DNS1123_SUBDOMAIN_FMT}$")).expect("valid regex"));

static C_IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{C_IDENTIFIER_FMT}$")).expect("valid regex"));

static LABEL_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{LABEL_VALUE_FMT}$")).expect("valid regex"));

static QUALIFIED_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{QUALIFIED_NAME_FMT}$")).expect("valid regex"));

static SEMVER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)(?:-((?:0|[1-9][0-9]*|[0-9]*[a-zA-Z-][0-9a-zA-Z-]*)(?:\.(?:0|[1-9][0-9]*|[0-9]*[a-zA-Z-][0-9a-zA-Z-]*))*))?(?:\+([0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$",
    )
    .expect("valid regex")
});

fn regex_error(msg: &str, fmt: &str, examples: &[&str]) -> String {
    let examples = examples
        .iter()
        .map(|e| format!("'{e}'"))
        .collect::<Vec<_>>()
        .join(",  or ");
    format!("{msg} (e.g. {examples}, regex used for validation is '{fmt}')")
}

fn max_len_error(max: usize) -> String {
    format!("must be no more than {max} characters")
}

pub fn is_dns1123_label(value: &str) -> Vec<String> {
    let mut errs = Vec::new();
    if value.len() > DNS1123_LABEL_MAX_LENGTH {
        errs.push(max_len_error(DNS1123_LABEL_MAX_LENGTH));
    }
    if !DNS1123_LABEL_RE.is_match(value) {
        errs.push(regex_error(
            "a lowercase RFC 1123 label must consist of lower case alphanumeric characters or '-', and must start and end with an alphanumeric character",
            DNS1123_LABEL_FMT,
            &["my-name", "123-abc"],
        ));
    }
    errs
}

fn dns1123_subdomain_format_error() -> String {
    regex_error(
        "a lowercase RFC 1123 subdomain must consist of lower case alphanumeric characters, '-' or '.', and must start and end with an alphanumeric character",
        DNS1123_SUBDOMAIN_FMT,
        &["example.com"],
    )
}

pub fn is_dns1123_subdomain(value: &str) -> Vec<String> {
    let mut errs = Vec::new();
    if value.len() > DNS1123_SUBDOMAIN_MAX_LENGTH {
        errs.push(max_len_error(DNS1123_SUBDOMAIN_MAX_LENGTH));
    }
    if !DNS1123_SUBDOMAIN_RE.is_match(value) {
        errs.push(dns1123_subdomain_format_error());
    }
    errs
}

pub fn is_c_identifier(value: &str) -> Vec<String> {
    if C_IDENTIFIER_RE.is_match(value) {
        return Vec::new();
    }
    vec![regex_error(
        "a valid C identifier must start with alphabetic character or '_', followed by a string of alphanumeric characters or '_'",
        C_IDENTIFIER_FMT,
        &["my_name", "MY_NAME", "MyName"],
    )]
}

pub fn is_label_value(value: &str) -> Vec<String> {
    let mut errs = Vec::new();
    if value.len() > LABEL_VALUE_MAX_LENGTH {
        errs.push(max_len_error(LABEL_VALUE_MAX_LENGTH));
    }
    if !LABEL_VALUE_RE.is_match(value) {
        errs.push(regex_error(
            "a valid label must be an empty string or consist of alphanumeric characters, '-', '_' or '.', and must start and end with an alphanumeric character",
            LABEL_VALUE_FMT,
            &["MyValue", "my_value", "12345"],
        ));
    }
    errs
}

/// Label and annotation keys: an optional `prefix/` subdomain and a name part.
pub fn is_label_key(value: &str) -> Vec<String> {
    let mut errs = Vec::new();
    let parts: Vec<&str> = value.split('/').collect();
    let name = match parts.as_slice() {
        [name] => *name,
        [prefix, name] => {
            if prefix.is_empty() {
                errs.push("prefix part must be non-empty".to_owned());
            } else {
                errs.extend(
                    is_dns1123_subdomain(prefix)
                        .into_iter()
                        .map(|msg| format!("prefix part {msg}")),
                );
            }
            *name
        }
        _ => {
            errs.push(regex_error(
                "a qualified name must consist of alphanumeric characters, '-', '_' or '.', and must start and end with an alphanumeric character",
                QUALIFIED_NAME_FMT,
                &["MyName", "my.name", "123-abc"],
            ) + " with an optional DNS subdomain prefix and '/' (e.g. 'example.com/MyName')");
            return errs;
        }
    };

    if name.is_empty() {
        errs.push("name part must be non-empty".to_owned());
    } else if name.len() > LABEL_KEY_NAME_MAX_LENGTH {
        errs.push(format!("name part {}", max_len_error(LABEL_KEY_NAME_MAX_LENGTH)));
    }
    if !QUALIFIED_NAME_RE.is_match(name) {
        errs.push(format!(
            "name part {}",
            regex_error(
                "must consist of alphanumeric characters, '-', '_' or '.', and must start and end with an alphanumeric character",
                QUALIFIED_NAME_FMT,
                &["MyName", "my.name", "123-abc"],
            )
        ));
    }
    errs
}

/// Semantic Versioning 2.0.0.
pub fn is_semver(value: &str) -> bool {
    SEMVER_RE.is_match(value)
}

fn invalid_each(value: &str, path: &FieldPath, messages: Vec<String>) -> ErrorList {
    messages
        .into_iter()
        .map(|msg| FieldError::invalid(path, value, msg))
        .collect()
}

/// Device, counter set and mixin names.
pub fn validate_dns_label(value: &str, path: &FieldPath) -> ErrorList {
    invalid_each(value, path, is_dns1123_label(value))
}

/// Node names and object names.
pub fn validate_dns_subdomain(value: &str, path: &FieldPath) -> ErrorList {
    invalid_each(value, path, is_dns1123_subdomain(value))
}

pub fn validate_label_value(value: &str, path: &FieldPath) -> ErrorList {
    invalid_each(value, path, is_label_value(value))
}

pub fn validate_label_key(value: &str, path: &FieldPath) -> ErrorList {
    invalid_each(value, path, is_label_key(value))
}

/// Counter names and the identifier part of qualified names: length first, then pattern.
pub fn validate_c_identifier(value: &str, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    if value.len() > DEVICE_MAX_ID_LENGTH {
        errs.push(FieldError::too_long(path, value, DEVICE_MAX_ID_LENGTH));
    }
    for msg in is_c_identifier(value) {
        errs.push(FieldError::type_invalid(path, value, msg));
    }
    errs
}

/// Attribute and capacity keys: `identifier` or `domain/identifier`.
///
/// The domain and identifier are checked independently, so `"/"` yields two
/// `Required` errors.
pub fn validate_qualified_name(name: &QualifiedName, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    let parts: Vec<&str> = name.as_str().split('/').collect();
    match parts.as_slice() {
        [id] => errs.extend(validate_c_identifier(id, path)),
        [domain, id] => {
            if domain.is_empty() {
                errs.push(FieldError::required(path, "the domain must not be empty"));
            } else {
                if domain.len() > DEVICE_MAX_DOMAIN_LENGTH {
                    errs.push(FieldError::too_long(path, *domain, DEVICE_MAX_DOMAIN_LENGTH));
                }
                if !DNS1123_SUBDOMAIN_RE.is_match(domain) {
                    errs.push(FieldError::invalid(
                        path,
                        *domain,
                        dns1123_subdomain_format_error(),
                    ));
                }
            }
            if id.is_empty() {
                errs.push(FieldError::required(path, "the name must not be empty"));
            } else {
                errs.extend(validate_c_identifier(id, path));
            }
        }
        _ => errs.push(FieldError::invalid(
            path,
            name.as_str(),
            "must be either a C identifier or a domain followed by a slash and a C identifier",
        )),
    }
    errs
}

/// Driver names: required, bounded, one subdomain.
pub fn validate_driver_name(value: &str, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    if value.is_empty() {
        errs.push(FieldError::required(path, ""));
        return errs;
    }
    if value.len() > DRIVER_NAME_MAX_LENGTH {
        errs.push(FieldError::too_long(path, value, DRIVER_NAME_MAX_LENGTH));
    }
    if !DNS1123_SUBDOMAIN_RE.is_match(value) {
        errs.push(FieldError::invalid(path, value, dns1123_subdomain_format_error()));
    }
    errs
}

/// Pool names: required, bounded, and every `/`-separated segment a subdomain.
pub fn validate_pool_name(value: &str, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    if value.is_empty() {
        errs.push(FieldError::required(path, ""));
        return errs;
    }
    if value.len() > POOL_NAME_MAX_LENGTH {
        errs.push(FieldError::too_long(path, value, POOL_NAME_MAX_LENGTH));
    }
    for segment in value.split('/') {
        errs.extend(validate_dns_subdomain(segment, path));
    }
    errs
}
