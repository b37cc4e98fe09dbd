use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use url::Url;

use super::model::{Gender, UserPatch};
use crate::error::AppError;

pub const MAX_SKILLS: usize = 10;
pub const MAX_SKILL_LEN: usize = 30;
pub const MAX_ABOUT_LEN: usize = 500;
pub const NAME_LEN: std::ops::RangeInclusive<usize> = 2..=50;
pub const AGE_RANGE: std::ops::RangeInclusive<i64> = 18..=90;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Fields a user may change after signup.
pub const ALLOWED_UPDATES: [&str; 5] = ["photoUrl", "about", "gender", "age", "skills"];

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trim and lowercase, then check the shape.
pub fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::validation("Invalid email"));
    }
    Ok(email)
}

pub fn validate_first_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if !NAME_LEN.contains(&name.chars().count()) {
        return Err(AppError::validation(format!(
            "firstName must be between {} and {} characters",
            NAME_LEN.start(),
            NAME_LEN.end()
        )));
    }
    Ok(name.to_string())
}

pub fn validate_last_name(raw: Option<&str>) -> Result<Option<String>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(name) if name.chars().count() > *NAME_LEN.end() => Err(AppError::validation(
            format!("lastName must be at most {} characters", NAME_LEN.end()),
        )),
        Some(name) => Ok(Some(name.to_string())),
    }
}

pub fn validate_password(raw: &str) -> Result<(), AppError> {
    if raw.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub fn validate_photo_url(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(u) if matches!(u.scheme(), "http" | "https") && u.host().is_some() => {
            Ok(trimmed.to_string())
        }
        _ => Err(AppError::validation("Invalid photoUrl")),
    }
}

fn validate_skills(values: &[Value]) -> Result<Vec<String>, AppError> {
    if values.len() > MAX_SKILLS {
        return Err(AppError::validation(format!(
            "Skills cannot be more than {}",
            MAX_SKILLS
        )));
    }
    values
        .iter()
        .map(|v| {
            let skill = v
                .as_str()
                .map(str::trim)
                .ok_or_else(|| AppError::validation("skills must be strings"))?;
            if skill.is_empty() || skill.chars().count() > MAX_SKILL_LEN {
                return Err(AppError::validation(format!(
                    "Each skill must be 1 to {} characters",
                    MAX_SKILL_LEN
                )));
            }
            Ok(skill.to_string())
        })
        .collect()
}

/// Turn a raw update body into a patch. Any disallowed key rejects the whole body.
pub fn parse_update(body: &Map<String, Value>) -> Result<UserPatch, AppError> {
    let mut rejected: Vec<&str> = body
        .keys()
        .map(String::as_str)
        .filter(|k| !ALLOWED_UPDATES.contains(k))
        .collect();
    if !rejected.is_empty() {
        rejected.sort_unstable();
        return Err(AppError::validation(format!(
            "Update not allowed: {}",
            rejected.join(", ")
        )));
    }

    let mut patch = UserPatch::default();
    for (key, value) in body {
        match (key.as_str(), value) {
            ("photoUrl", Value::String(s)) => patch.photo_url = Some(validate_photo_url(s)?),
            ("about", Value::String(s)) => {
                let about = s.trim();
                if about.chars().count() > MAX_ABOUT_LEN {
                    return Err(AppError::validation(format!(
                        "about must be at most {} characters",
                        MAX_ABOUT_LEN
                    )));
                }
                patch.about = Some(about.to_string());
            }
            ("gender", Value::String(s)) => {
                let gender = Gender::parse(s).ok_or_else(|| {
                    AppError::validation(format!("{} is not a valid gender", s.trim()))
                })?;
                patch.gender = Some(gender);
            }
            ("age", Value::Number(n)) => {
                let age = n
                    .as_i64()
                    .filter(|a| AGE_RANGE.contains(a))
                    .ok_or_else(|| {
                        AppError::validation(format!(
                            "age must be between {} and {}",
                            AGE_RANGE.start(),
                            AGE_RANGE.end()
                        ))
                    })?;
                patch.age = Some(age as i32);
            }
            ("skills", Value::Array(items)) => patch.skills = Some(validate_skills(items)?),
            (field, _) => {
                return Err(AppError::validation(format!("Invalid value for {}", field)));
            }
        }
    }

    if patch.is_empty() {
        return Err(AppError::validation("Nothing to update"));
    }
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().expect("object")
    }

    #[test]
    fn email_is_normalized() {
        assert_eq!(normalize_email("  A@X.com ").unwrap(), "a@x.com");
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("a@b").is_err());
    }

    #[test]
    fn first_name_length_is_bounded() {
        assert_eq!(validate_first_name(" Alice ").unwrap(), "Alice");
        assert!(validate_first_name("A").is_err());
        assert!(validate_first_name(&"x".repeat(51)).is_err());
    }

    #[test]
    fn blank_last_name_becomes_none() {
        assert_eq!(validate_last_name(Some("   ")).unwrap(), None);
        assert_eq!(validate_last_name(None).unwrap(), None);
        assert_eq!(validate_last_name(Some("Smith")).unwrap(), Some("Smith".into()));
    }

    #[test]
    fn short_password_is_rejected() {
        assert!(validate_password("secret").is_ok());
        assert!(validate_password("abc").is_err());
    }

    #[test]
    fn photo_url_must_be_http() {
        assert!(validate_photo_url("https://cdn.example.com/me.png").is_ok());
        assert!(validate_photo_url("ftp://example.com/me.png").is_err());
        assert!(validate_photo_url("me.png").is_err());
    }

    #[test]
    fn update_with_disallowed_field_is_rejected_wholesale() {
        let body = obj(json!({ "age": 30, "email": "evil@x.com" }));
        let err = parse_update(&body).unwrap_err();
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn update_parses_allowed_fields() {
        let body = obj(json!({
            "age": 30,
            "gender": " Female ",
            "about": "rustacean",
            "skills": ["rust", " sql "],
            "photoUrl": "https://example.com/p.png"
        }));
        let patch = parse_update(&body).unwrap();
        assert_eq!(patch.age, Some(30));
        assert_eq!(patch.gender, Some(Gender::Female));
        assert_eq!(patch.about.as_deref(), Some("rustacean"));
        assert_eq!(patch.skills, Some(vec!["rust".to_string(), "sql".to_string()]));
        assert_eq!(patch.photo_url.as_deref(), Some("https://example.com/p.png"));
    }

    #[test]
    fn too_many_skills_are_rejected() {
        let skills: Vec<String> = (0..11).map(|i| format!("skill{i}")).collect();
        let body = obj(json!({ "skills": skills }));
        let err = parse_update(&body).unwrap_err();
        assert!(err.to_string().contains("more than 10"));
    }

    #[test]
    fn age_out_of_range_is_rejected() {
        assert!(parse_update(&obj(json!({ "age": 17 }))).is_err());
        assert!(parse_update(&obj(json!({ "age": 91 }))).is_err());
        assert!(parse_update(&obj(json!({ "age": "30" }))).is_err());
    }

    #[test]
    fn unknown_gender_is_rejected() {
        let err = parse_update(&obj(json!({ "gender": "robot" }))).unwrap_err();
        assert!(err.to_string().contains("not a valid gender"));
    }

    #[test]
    fn empty_update_is_rejected() {
        assert!(parse_update(&Map::new()).is_err());
    }
}
