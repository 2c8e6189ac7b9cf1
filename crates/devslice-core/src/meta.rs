//! Object metadata checks, kept behind a trait so hosts can supply their own.

use devslice_schema::limits::TOTAL_ANNOTATION_SIZE_LIMIT;
use devslice_schema::names::{
    is_dns1123_subdomain, validate_dns_subdomain, validate_label_key, validate_label_value,
};
use devslice_schema::{ErrorList, FieldError, FieldPath, ObjectMeta};
use serde::Serialize;

pub trait MetaValidator {
    fn validate_create(&self, meta: &ObjectMeta, path: &FieldPath) -> ErrorList;

    fn validate_update(&self, new: &ObjectMeta, old: &ObjectMeta, path: &FieldPath) -> ErrorList;
}

/// Name, generateName, labels and annotations syntax; name immutability on update.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicMetaValidator;

impl MetaValidator for BasicMetaValidator {
    fn validate_create(&self, meta: &ObjectMeta, path: &FieldPath) -> ErrorList {
        let mut errs = ErrorList::new();
        let generate_name = meta.generate_name.as_deref().unwrap_or_default();

        if meta.name.is_empty() {
            if generate_name.is_empty() {
                errs.push(FieldError::required(
                    &path.child("name"),
                    "name or generateName is required",
                ));
            }
        } else {
            errs.extend(validate_dns_subdomain(&meta.name, &path.child("name")));
        }

        if !generate_name.is_empty() {
            // A trailing dash is allowed; a random suffix follows it.
            let prefix = generate_name.strip_suffix('-').unwrap_or(generate_name);
            for msg in is_dns1123_subdomain(prefix) {
                errs.push(FieldError::invalid(
                    &path.child("generateName"),
                    generate_name,
                    msg,
                ));
            }
        }

        if meta.generation < 0 {
            errs.push(FieldError::invalid(
                &path.child("generation"),
                meta.generation,
                "must be greater than or equal to 0",
            ));
        }

        let labels_path = path.child("labels");
        for (key, value) in &meta.labels {
            errs.extend(validate_label_key(key, &labels_path));
            errs.extend(validate_label_value(value, &labels_path));
        }

        let annotations_path = path.child("annotations");
        let mut total_size = 0usize;
        for (key, value) in &meta.annotations {
            errs.extend(validate_label_key(&key.to_lowercase(), &annotations_path));
            total_size += key.len() + value.len();
        }
        if total_size > TOTAL_ANNOTATION_SIZE_LIMIT {
            errs.push(FieldError::too_long(
                &annotations_path,
                "",
                TOTAL_ANNOTATION_SIZE_LIMIT,
            ));
        }

        errs
    }

    fn validate_update(&self, new: &ObjectMeta, old: &ObjectMeta, path: &FieldPath) -> ErrorList {
        let mut errs = self.validate_create(new, path);
        errs.extend(validate_immutable_field(
            &new.name,
            &old.name,
            &path.child("name"),
        ));
        errs
    }
}

/// `Invalid(path, new, "field is immutable")` when the values differ.
pub fn validate_immutable_field<T>(new: &T, old: &T, path: &FieldPath) -> ErrorList
where
    T: PartialEq + Serialize + ?Sized,
{
    if new == old {
        return ErrorList::new();
    }
    vec![FieldError::invalid(
        path,
        serde_json::to_value(new).unwrap_or_default(),
        "field is immutable",
    )]
}
