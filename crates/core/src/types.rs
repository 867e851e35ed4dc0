use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Collection paths in the document store.
pub mod collections {
    pub const WORKSPACES: &str = "workspaces";
    pub const USERS: &str = "users";
    pub const PLATFORM: &str = "platform";
    pub const PLATFORM_CONFIG_ID: &str = "config";
    /// Append-only sub-collection under the platform config document.
    pub const AUDIT_LOG: &str = "platform/config/auditLog";
}

/// Suspension status shared by users and workspaces.
///
/// Only the literal `"suspended"` reads as suspended. A missing field, a null,
/// or any other value (of any JSON type) is treated as active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<Value>", into = "String")]
pub enum EntityStatus {
    #[default]
    Active,
    Suspended,
}

impl EntityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::Active => "active",
            EntityStatus::Suspended => "suspended",
        }
    }

    /// Human label used by the table views.
    pub fn label(&self) -> &'static str {
        match self {
            EntityStatus::Active => "Active",
            EntityStatus::Suspended => "Suspended",
        }
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self, EntityStatus::Suspended)
    }
}

impl From<Option<String>> for EntityStatus {
    fn from(raw: Option<String>) -> Self {
        match raw.as_deref() {
            Some("suspended") => EntityStatus::Suspended,
            _ => EntityStatus::Active,
        }
    }
}

impl From<Option<Value>> for EntityStatus {
    fn from(raw: Option<Value>) -> Self {
        match raw {
            Some(Value::String(s)) if s == "suspended" => EntityStatus::Suspended,
            _ => EntityStatus::Active,
        }
    }
}

impl From<EntityStatus> for String {
    fn from(status: EntityStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default)]
    pub status: EntityStatus,
}

/// Role a user holds inside a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MemberRole {
    Owner,
    Admin,
    Member,
    /// Any role this console does not interpret, kept verbatim.
    Other(String),
}

impl MemberRole {
    pub fn as_str(&self) -> &str {
        match self {
            MemberRole::Owner => "owner",
            MemberRole::Admin => "admin",
            MemberRole::Member => "member",
            MemberRole::Other(role) => role,
        }
    }
}

impl From<String> for MemberRole {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "owner" => MemberRole::Owner,
            "admin" => MemberRole::Admin,
            "member" => MemberRole::Member,
            _ => MemberRole::Other(raw),
        }
    }
}

impl From<MemberRole> for String {
    fn from(role: MemberRole) -> Self {
        match role {
            MemberRole::Other(role) => role,
            known => known.as_str().to_string(),
        }
    }
}

/// One `(user, role)` pair of a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub user_id: String,
    pub role: MemberRole,
}

/// Tenant workspace.
///
/// Members are stored as a map keyed by user id and held here as a list
/// ordered by user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub status: EntityStatus,
    #[serde(default, with = "member_map")]
    pub members: Vec<Membership>,
}

impl Workspace {
    /// First member holding the owner role, in user-id order.
    pub fn owner_entry(&self) -> Option<&Membership> {
        self.members.iter().find(|m| m.role == MemberRole::Owner)
    }

    pub fn owner_count(&self) -> usize {
        self.members
            .iter()
            .filter(|m| m.role == MemberRole::Owner)
            .count()
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.user_id == user_id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

mod member_map {
    use super::{MemberRole, Membership};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct MemberRecord<'a> {
        role: &'a MemberRole,
    }

    /// A member without a readable role is kept, holding no known role.
    #[derive(Deserialize)]
    struct StoredMember {
        #[serde(default)]
        role: Option<MemberRole>,
    }

    pub fn serialize<S: Serializer>(members: &[Membership], s: S) -> Result<S::Ok, S::Error> {
        let map: BTreeMap<&str, MemberRecord<'_>> = members
            .iter()
            .map(|m| (m.user_id.as_str(), MemberRecord { role: &m.role }))
            .collect();
        map.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Membership>, D::Error> {
        let map = Option::<BTreeMap<String, Option<StoredMember>>>::deserialize(d)?;
        Ok(map
            .unwrap_or_default()
            .into_iter()
            .map(|(user_id, record)| Membership {
                user_id,
                role: record
                    .and_then(|r| r.role)
                    .unwrap_or_else(|| MemberRole::Other(String::new())),
            })
            .collect())
    }
}

/// Read a null the same way as a missing field.
fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// JSON object kept as an ordered list of entries, in document order. Null
/// values read as `T::default()`.
mod ordered_map {
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::fmt;
    use std::marker::PhantomData;

    pub fn serialize<S, T>(entries: &[(String, T)], s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        let mut map = s.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, T>(d: D) -> Result<Vec<(String, T)>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        d.deserialize_any(EntriesVisitor(PhantomData))
    }

    struct EntriesVisitor<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de> + Default> Visitor<'de> for EntriesVisitor<T> {
        type Value = Vec<(String, T)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a JSON object")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((key, value)) = access.next_entry::<String, Option<T>>()? {
                entries.push((key, value.unwrap_or_default()));
            }
            Ok(entries)
        }
    }
}

/// Default access rule for one platform feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturePermission {
    #[serde(default, deserialize_with = "null_as_default")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub allowed_roles: Vec<String>,
}

/// Singleton platform configuration document (`platform/config`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConfig {
    /// Flags in document order.
    #[serde(default, with = "ordered_map")]
    pub feature_flags: Vec<(String, bool)>,
    /// Per-feature defaults in document order.
    #[serde(default, with = "ordered_map")]
    pub default_permissions: Vec<(String, FeaturePermission)>,
}

/// Code identifying a privileged action in the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AuditAction {
    SuspendWorkspace,
    ReactivateWorkspace,
    SuspendUser,
    ReactivateUser,
    Impersonate,
    /// Codes written by other tools.
    Other(String),
}

impl AuditAction {
    pub fn as_str(&self) -> &str {
        match self {
            AuditAction::SuspendWorkspace => "SUSPEND_WORKSPACE",
            AuditAction::ReactivateWorkspace => "REACTIVATE_WORKSPACE",
            AuditAction::SuspendUser => "SUSPEND_USER",
            AuditAction::ReactivateUser => "REACTIVATE_USER",
            AuditAction::Impersonate => "IMPERSONATE",
            AuditAction::Other(code) => code,
        }
    }
}

impl Default for AuditAction {
    fn default() -> Self {
        AuditAction::Other(String::new())
    }
}

impl From<&str> for AuditAction {
    fn from(code: &str) -> Self {
        match code {
            "SUSPEND_WORKSPACE" => AuditAction::SuspendWorkspace,
            "REACTIVATE_WORKSPACE" => AuditAction::ReactivateWorkspace,
            "SUSPEND_USER" => AuditAction::SuspendUser,
            "REACTIVATE_USER" => AuditAction::ReactivateUser,
            "IMPERSONATE" => AuditAction::Impersonate,
            other => AuditAction::Other(other.to_string()),
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AuditAction {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AuditAction {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let code = Option::<String>::deserialize(d)?.unwrap_or_default();
        Ok(AuditAction::from(code.as_str()))
    }
}

/// Kind of entity an audit entry refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum TargetType {
    User,
    Workspace,
    /// Kinds written by other tools, kept verbatim.
    Other(String),
}

impl TargetType {
    pub fn as_str(&self) -> &str {
        match self {
            TargetType::User => "user",
            TargetType::Workspace => "workspace",
            TargetType::Other(kind) => kind,
        }
    }
}

impl Default for TargetType {
    fn default() -> Self {
        TargetType::Other(String::new())
    }
}

impl From<Option<String>> for TargetType {
    fn from(raw: Option<String>) -> Self {
        match raw.as_deref() {
            Some("user") => TargetType::User,
            Some("workspace") => TargetType::Workspace,
            _ => TargetType::Other(raw.unwrap_or_default()),
        }
    }
}

impl From<TargetType> for String {
    fn from(kind: TargetType) -> Self {
        match kind {
            TargetType::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse an audit timestamp as written by any client.
///
/// Accepts RFC 3339, ISO date-times without a zone (read as UTC), bare dates,
/// epoch milliseconds, and `{seconds, nanoseconds}` objects with or without a
/// leading underscore. Anything else yields `None`.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => {
            let raw = raw.trim();
            if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
                return Some(ts.with_timezone(&Utc));
            }
            for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
                if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                    return Some(naive.and_utc());
                }
            }
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        }
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            Utc.timestamp_opt(seconds, u32::try_from(nanos).ok()?).single()
        }
        _ => None,
    }
}

mod lenient_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<Value>::deserialize(d)?;
        Ok(raw.as_ref().and_then(super::parse_timestamp))
    }
}

/// Immutable record of one administrative action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    /// Assigned by the store on append; empty until then.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// `None` when the stored value is missing or unreadable.
    #[serde(default, deserialize_with = "lenient_timestamp::deserialize")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub action: AuditAction,
    #[serde(default, deserialize_with = "null_as_default")]
    pub performed_by: String,
    #[serde(default)]
    pub target_type: TargetType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub target_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub details: String,
}
