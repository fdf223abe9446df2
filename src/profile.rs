//! Profile editor form and merging of update responses.

use crate::api::{ProfileUpdate, SessionUser};
use serde_json::{Map, Value};

/// Editable fields, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Username,
    FirstName,
    LastName,
    Email,
    Batch,
    Profession,
    Mobile,
    CountryCode,
}

impl ProfileField {
    pub const ALL: [ProfileField; 8] = [
        ProfileField::Username,
        ProfileField::FirstName,
        ProfileField::LastName,
        ProfileField::Email,
        ProfileField::Batch,
        ProfileField::Profession,
        ProfileField::Mobile,
        ProfileField::CountryCode,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Username => "Username",
            Self::FirstName => "First Name",
            Self::LastName => "Last Name",
            Self::Email => "Email",
            Self::Batch => "Batch",
            Self::Profession => "Profession",
            Self::Mobile => "Mobile",
            Self::CountryCode => "Country Code",
        }
    }

    /// Whether `POST /me` sends this field. The rest are shown for context.
    pub fn is_submitted(self) -> bool {
        matches!(
            self,
            Self::FirstName | Self::LastName | Self::Email | Self::Batch | Self::Mobile
        )
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Form state, prefilled from the stored user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub batch: String,
    pub profession: String,
    pub mobile: String,
    pub country_code: String,
}

impl ProfileForm {
    pub fn from_user(user: &SessionUser) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            username: text(&user.user.user_nicename),
            first_name: text(&user.user_meta.first_name),
            last_name: text(&user.user_meta.last_name),
            email: text(&user.user.user_email),
            batch: text(&user.user.ds_batch),
            profession: text(&user.user.ds_profession),
            mobile: text(&user.ds_res_mobile),
            country_code: text(&user.country_code),
        }
    }

    pub fn field(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::Username => &self.username,
            ProfileField::FirstName => &self.first_name,
            ProfileField::LastName => &self.last_name,
            ProfileField::Email => &self.email,
            ProfileField::Batch => &self.batch,
            ProfileField::Profession => &self.profession,
            ProfileField::Mobile => &self.mobile,
            ProfileField::CountryCode => &self.country_code,
        }
    }

    pub fn field_mut(&mut self, field: ProfileField) -> &mut String {
        match field {
            ProfileField::Username => &mut self.username,
            ProfileField::FirstName => &mut self.first_name,
            ProfileField::LastName => &mut self.last_name,
            ProfileField::Email => &mut self.email,
            ProfileField::Batch => &mut self.batch,
            ProfileField::Profession => &mut self.profession,
            ProfileField::Mobile => &mut self.mobile,
            ProfileField::CountryCode => &mut self.country_code,
        }
    }

    /// "First Last" heading, trimmed.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn to_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            ds_batch: self.batch.clone(),
            ds_res_mobile: self.mobile.clone(),
            user_email: self.email.clone(),
        }
    }
}

/// Fold a `POST /me` response into a copy of the stored user.
///
/// Everything lands on `user` like the server's own profile object; name and
/// mobile values are also mirrored to where the form reads them from.
pub fn apply_update(user: &SessionUser, response: &Map<String, Value>) -> SessionUser {
    let mut updated = user.clone();
    updated.user.merge(response);

    let text = |key: &str| response.get(key).and_then(Value::as_str).map(str::to_string);
    if let Some(first) = text("first_name") {
        updated.user_meta.first_name = Some(first);
    }
    if let Some(last) = text("last_name") {
        updated.user_meta.last_name = Some(last);
    }
    if let Some(mobile) = text("ds_res_mobile") {
        updated.ds_res_mobile = Some(mobile);
    }
    updated
}

/// Record a new profile picture URL on a copy of the stored user.
pub fn apply_picture(user: &SessionUser, picture: Option<String>) -> SessionUser {
    let mut updated = user.clone();
    if picture.is_some() {
        updated.user.ds_profile_pic = picture;
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{UserMeta, UserProfile};
    use pretty_assertions::assert_eq;

    fn stored_user() -> SessionUser {
        SessionUser {
            token: Some("t".to_string()),
            user: UserProfile {
                user_nicename: Some("asha".to_string()),
                user_email: Some("asha@example.com".to_string()),
                ds_batch: Some("1998".to_string()),
                ..UserProfile::default()
            },
            user_meta: UserMeta {
                first_name: Some("Asha".to_string()),
                last_name: Some("Rao".to_string()),
                ..UserMeta::default()
            },
            ds_res_mobile: Some("98450".to_string()),
            ..SessionUser::default()
        }
    }

    #[test]
    fn test_prefill() {
        let form = ProfileForm::from_user(&stored_user());
        assert_eq!(form.username, "asha");
        assert_eq!(form.first_name, "Asha");
        assert_eq!(form.mobile, "98450");
        assert_eq!(form.profession, "");
        assert_eq!(form.display_name(), "Asha Rao");
    }

    #[test]
    fn test_update_body_uses_form_values() {
        let mut form = ProfileForm::from_user(&stored_user());
        form.field_mut(ProfileField::Batch).push('9');
        let update = form.to_update();
        assert_eq!(update.ds_batch, "19989");
        assert_eq!(update.user_email, "asha@example.com");
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({
                "first_name": "Asha",
                "last_name": "Rao",
                "ds_batch": "19989",
                "ds_res_mobile": "98450",
                "user_email": "asha@example.com"
            })
        );
    }

    #[test]
    fn test_apply_update_merges_response() {
        let response: Map<String, Value> = serde_json::from_value(serde_json::json!({
            "user_email": "new@example.com",
            "first_name": "Ashwini"
        }))
        .unwrap();
        let updated = apply_update(&stored_user(), &response);
        assert_eq!(updated.user.user_email.as_deref(), Some("new@example.com"));
        assert_eq!(updated.user_meta.first_name.as_deref(), Some("Ashwini"));
        assert_eq!(updated.user.ds_batch.as_deref(), Some("1998"));
        assert_eq!(updated.token.as_deref(), Some("t"));
    }

    #[test]
    fn test_apply_picture() {
        let updated = apply_picture(&stored_user(), Some("https://img/p.jpg".to_string()));
        assert_eq!(updated.user.ds_profile_pic.as_deref(), Some("https://img/p.jpg"));
        let unchanged = apply_picture(&updated, None);
        assert_eq!(unchanged.user.ds_profile_pic.as_deref(), Some("https://img/p.jpg"));
    }

    #[test]
    fn test_field_cycle() {
        assert_eq!(ProfileField::Username.prev(), ProfileField::CountryCode);
        assert_eq!(ProfileField::CountryCode.next(), ProfileField::Username);
        assert!(ProfileField::Email.is_submitted());
        assert!(!ProfileField::Username.is_submitted());
    }
}
