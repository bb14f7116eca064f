//! CSV bulk import of users, equipment and venues
//!
//! Parsing is synchronous and independent of the database; each import then
//! does a get-or-create per row keyed on the natural key of the record.

use std::io::Read;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{
        equipment::{clamp_available, EquipmentStatus},
        import_report::ImportReport,
        user::{CreateUser, Role},
        venue::VenueRequest,
    },
    repository::{equipment::NewEquipment, Repository},
    services::users::hash_password,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawUser {
    username: Option<String>,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    role: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEquipment {
    name: Option<String>,
    category_name: Option<String>,
    identifier: Option<String>,
    description: Option<String>,
    quantity_total: Option<String>,
    quantity_available: Option<String>,
    status: Option<String>,
    purchase_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawVenue {
    name: Option<String>,
    capacity: Option<String>,
    location: Option<String>,
    has_projector: Option<String>,
    has_whiteboard: Option<String>,
}

/// Equipment row ready to insert, category still by name
#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentRow {
    pub name: String,
    pub category_name: Option<String>,
    pub identifier: String,
    pub description: Option<String>,
    pub quantity_total: i32,
    pub quantity_available: i32,
    pub status: EquipmentStatus,
    pub purchase_date: Option<NaiveDate>,
}

fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse every record of a CSV stream, skipping records that fail to decode
fn read_records<R, T>(reader: R, report: &mut ImportReport) -> Vec<(usize, T)>
where
    R: Read,
    T: for<'de> Deserialize<'de>,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (index, result) in csv_reader.deserialize::<T>().enumerate() {
        // header is line 1
        let line = index + 2;
        match result {
            Ok(row) => rows.push((line, row)),
            Err(e) => report.skipped(format!("Line {}: unreadable record ({})", line, e)),
        }
    }
    rows
}

/// `true` in any letter case
fn parse_flag(value: Option<String>) -> bool {
    clean(value).map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

pub fn parse_users<R: Read>(reader: R, report: &mut ImportReport) -> Vec<CreateUser> {
    let mut users = Vec::new();

    for (line, raw) in read_records::<_, RawUser>(reader, report) {
        let Some(username) = clean(raw.username) else {
            report.skipped(format!("Line {}: username missing", line));
            continue;
        };
        let Some(password) = raw.password.filter(|p| !p.is_empty()) else {
            report.skipped(format!("Line {}: password missing for {}", line, username));
            continue;
        };
        let role = match clean(raw.role) {
            None => Role::Student,
            Some(r) => match r.parse::<Role>() {
                Ok(role) => role,
                Err(e) => {
                    report.skipped(format!("Line {}: {} for {}", line, e, username));
                    continue;
                }
            },
        };

        users.push(CreateUser {
            username,
            email: clean(raw.email).unwrap_or_default(),
            password,
            first_name: clean(raw.first_name).unwrap_or_default(),
            last_name: clean(raw.last_name).unwrap_or_default(),
            role: Some(role),
            phone_number: None,
            date_of_birth: None,
        });
    }

    users
}

/// A missing quantity falls back to `default`
fn parse_quantity(value: Option<String>, default: i32) -> Result<i32, ()> {
    match clean(value) {
        None => Ok(default),
        Some(v) => v.parse::<i32>().map_err(|_| ()).and_then(|q| if q < 0 { Err(()) } else { Ok(q) }),
    }
}

pub fn parse_equipment<R: Read>(reader: R, report: &mut ImportReport) -> Vec<EquipmentRow> {
    let mut rows = Vec::new();

    for (line, raw) in read_records::<_, RawEquipment>(reader, report) {
        let name = clean(raw.name).unwrap_or_else(|| "Unnamed Equipment".to_string());

        let purchase_date = match clean(raw.purchase_date) {
            None => None,
            Some(value) => match NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    report.note(format!(
                        "Line {}: invalid purchase_date '{}' for {}, ignoring it",
                        line, value, name
                    ));
                    None
                }
            },
        };

        let Ok(quantity_total) = parse_quantity(raw.quantity_total, 1) else {
            report.skipped(format!("Line {}: invalid quantity for {}", line, name));
            continue;
        };
        let Ok(quantity_available) = parse_quantity(raw.quantity_available, quantity_total) else {
            report.skipped(format!("Line {}: invalid quantity for {}", line, name));
            continue;
        };

        let Some(identifier) = clean(raw.identifier) else {
            report.skipped(format!("Line {}: identifier missing for {}", line, name));
            continue;
        };

        let status = match clean(raw.status) {
            None => EquipmentStatus::Available,
            Some(s) => match s.parse::<EquipmentStatus>() {
                Ok(status) => status,
                Err(e) => {
                    report.note(format!("Line {}: {}, using available", line, e));
                    EquipmentStatus::Available
                }
            },
        };

        rows.push(EquipmentRow {
            name,
            category_name: clean(raw.category_name),
            identifier,
            description: clean(raw.description),
            quantity_total,
            quantity_available: clamp_available(quantity_available, quantity_total),
            status,
            purchase_date,
        });
    }

    rows
}

pub fn parse_venues<R: Read>(reader: R, report: &mut ImportReport) -> Vec<VenueRequest> {
    let mut venues = Vec::new();

    for (line, raw) in read_records::<_, RawVenue>(reader, report) {
        let Some(name) = clean(raw.name) else {
            report.skipped(format!("Line {}: name missing", line));
            continue;
        };
        let capacity = match clean(raw.capacity) {
            None => None,
            Some(c) => match c.parse::<i32>() {
                Ok(capacity) if capacity >= 0 => Some(capacity),
                _ => {
                    report.skipped(format!("Line {}: capacity '{}' is not a number for {}", line, c, name));
                    continue;
                }
            },
        };

        venues.push(VenueRequest {
            name,
            capacity,
            location: clean(raw.location),
            has_projector: parse_flag(raw.has_projector),
            has_whiteboard: parse_flag(raw.has_whiteboard),
        });
    }

    venues
}

#[derive(Clone)]
pub struct ImportService {
    repository: Repository,
}

impl ImportService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Create users that do not exist yet; passwords are hashed on creation only
    pub async fn import_users<R: Read>(&self, reader: R) -> AppResult<ImportReport> {
        let mut report = ImportReport::default();

        for user in parse_users(reader, &mut report) {
            if self.repository.users.username_exists(&user.username, None).await? {
                report.skipped(format!("User {} already exists", user.username));
                continue;
            }
            let password_hash = hash_password(&user.password)?;
            let created = self.repository.users.create(&user, &password_hash).await?;
            report.created(format!("Created user {} ({})", created.username, created.role));
        }

        tracing::info!(created = report.created, skipped = report.skipped, "User import finished");
        Ok(report)
    }

    /// Create equipment that does not exist yet, keyed on identifier
    pub async fn import_equipment<R: Read>(&self, reader: R) -> AppResult<ImportReport> {
        let mut report = ImportReport::default();
        let repo = &self.repository.equipment;

        for row in parse_equipment(reader, &mut report) {
            let category_id = match &row.category_name {
                Some(name) => {
                    let (id, created) = repo.get_or_create_category(name).await?;
                    if created {
                        report.note(format!("Created category {}", name));
                    }
                    Some(id)
                }
                None => None,
            };

            if repo.identifier_exists(&row.identifier).await? {
                report.skipped(format!(
                    "Equipment {} with identifier {} already exists",
                    row.name, row.identifier
                ));
                continue;
            }

            let created = repo
                .insert(&NewEquipment {
                    name: row.name,
                    category_id,
                    identifier: row.identifier,
                    description: row.description,
                    quantity_total: row.quantity_total,
                    quantity_available: row.quantity_available,
                    status: row.status,
                    purchase_date: row.purchase_date,
                })
                .await?;
            report.created(format!("Created equipment {} ({})", created.name, created.identifier));
        }

        tracing::info!(created = report.created, skipped = report.skipped, "Equipment import finished");
        Ok(report)
    }

    /// Create venues that do not exist yet, keyed on name
    pub async fn import_venues<R: Read>(&self, reader: R) -> AppResult<ImportReport> {
        let mut report = ImportReport::default();

        for venue in parse_venues(reader, &mut report) {
            if self.repository.venues.name_exists(&venue.name).await? {
                report.skipped(format!("Venue {} already exists", venue.name));
                continue;
            }
            let created = self.repository.venues.create(&venue).await?;
            report.created(format!("Created venue {}", created.name));
        }

        tracing::info!(created = report.created, skipped = report.skipped, "Venue import finished");
        Ok(report)
    }

    /// Create an administrator, failing when the username is taken
    pub async fn create_admin(&self, username: &str, email: &str, password: &str) -> AppResult<String> {
        if self.repository.users.username_exists(username, None).await? {
            return Err(AppError::Conflict(format!("User {} already exists", username)));
        }
        let admin = CreateUser {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            role: Some(Role::Admin),
            phone_number: None,
            date_of_birth: None,
        };
        validator::Validate::validate(&admin)?;
        let password_hash = hash_password(&admin.password)?;
        let created = self.repository.users.create(&admin, &password_hash).await?;
        Ok(created.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_users() {
        let csv = "\
username,email,first_name,last_name,role,password
alice,alice@example.edu,Alice,Liddell,teacher,wonderland
bob,bob@example.edu,Bob,,,builder123
,nobody@example.edu,,,student,secret123
carol,carol@example.edu,Carol,,janitor,secret123
dave,dave@example.edu,Dave,,student,
";
        let mut report = ImportReport::default();
        let users = parse_users(csv.as_bytes(), &mut report);

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].username, "alice");
        assert_eq!(users[0].role, Some(Role::Teacher));
        assert_eq!(users[1].role, Some(Role::Student));
        assert_eq!(report.skipped, 3);
    }

    #[test]
    fn test_parse_equipment_rules() {
        let csv = "\
name,category_name,identifier,description,quantity_total,quantity_available,status,purchase_date
Projector,AV,PJ-1,Ceiling mount,3,5,,2023-09-01
Camera,AV,CAM-1,,2,2,under_repair,01/09/2023
Tripod,,,,1,1,,
Laptop,IT,LT-1,,two,1,,
Microscope,Lab,MS-1,,4,4,lost,
";
        let mut report = ImportReport::default();
        let rows = parse_equipment(csv.as_bytes(), &mut report);

        assert_eq!(rows.len(), 3);

        let projector = &rows[0];
        assert_eq!(projector.quantity_available, 3);
        assert_eq!(projector.status, EquipmentStatus::Available);
        assert_eq!(projector.purchase_date, NaiveDate::from_ymd_opt(2023, 9, 1));
        assert_eq!(projector.category_name.as_deref(), Some("AV"));

        let camera = &rows[1];
        assert_eq!(camera.status, EquipmentStatus::UnderRepair);
        assert_eq!(camera.purchase_date, None);

        assert_eq!(rows[2].status, EquipmentStatus::Available);

        // missing identifier and bad quantity
        assert_eq!(report.skipped, 2);
        assert!(report.messages.iter().any(|m| m.contains("invalid purchase_date")));
    }

    #[test]
    fn test_parse_equipment_default_quantities() {
        let csv = "name,identifier\nWhiteboard marker,WB-9\n";
        let mut report = ImportReport::default();
        let rows = parse_equipment(csv.as_bytes(), &mut report);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity_total, 1);
        assert_eq!(rows[0].quantity_available, 1);
    }

    #[test]
    fn test_parse_equipment_available_defaults_to_total() {
        let csv = "\
name,category_name,identifier,description,quantity_total,quantity_available,status,purchase_date
Laptops,,LT-9,,5,,,
Tablets,,TB-2,,4,9,,
";
        let mut report = ImportReport::default();
        let rows = parse_equipment(csv.as_bytes(), &mut report);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].quantity_total, 5);
        assert_eq!(rows[0].quantity_available, 5);
        assert_eq!(rows[1].quantity_available, 4);
    }

    #[test]
    fn test_parse_venues() {
        let csv = "\
name,capacity,location,has_projector,has_whiteboard
Main Hall,300,Building A,TRUE,false
Lab 2,lots,Building B,true,true
Room 101,,Building C,yes,True
";
        let mut report = ImportReport::default();
        let venues = parse_venues(csv.as_bytes(), &mut report);

        assert_eq!(venues.len(), 2);
        assert_eq!(venues[0].capacity, Some(300));
        assert!(venues[0].has_projector);
        assert!(!venues[0].has_whiteboard);

        assert_eq!(venues[1].name, "Room 101");
        assert_eq!(venues[1].capacity, None);
        assert!(!venues[1].has_projector);
        assert!(venues[1].has_whiteboard);

        assert_eq!(report.skipped, 1);
    }
}
