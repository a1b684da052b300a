use actix_web::{web, App, HttpServer, HttpResponse, Result, HttpRequest, middleware};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::error::StoreError;
use crate::ledger::{commit, Confirmation, WorkloadLedger};
use crate::parser::parse_schedules_csv;
use crate::schedule::{plan_absence, AbsenceRequest, AllocationResult, TeacherSchedule};
use crate::store::{DataStore, FileLedger};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Shared server state. The ledger mutex serializes every commit.
pub struct AppState {
    pub config: AppConfig,
    pub store: DataStore,
    pub schedules: Mutex<Vec<TeacherSchedule>>,
    pub ledger: Mutex<FileLedger>,
}

impl AppState {
    pub fn load(config: AppConfig) -> std::result::Result<Self, StoreError> {
        let store = DataStore::new(&config.data_dir);
        let schedules = store.schedules_or_empty();
        let ledger = FileLedger::open(store.clone())?;
        Ok(Self {
            config,
            store,
            schedules: Mutex::new(schedules),
            ledger: Mutex::new(ledger),
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Deserialize)]
pub struct LoginRequest {
    password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProposalRequest {
    pub absent_teacher: Option<String>,
    pub day: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    #[serde(default)]
    pub full_day: bool,
    pub date: Option<String>,
}

#[derive(Serialize)]
pub struct ProposalResponse {
    request: AbsenceRequest,
    date: String,
    needs_external_staff: bool,
    result: AllocationResult,
}

#[derive(Deserialize)]
pub struct ConfirmationRequest {
    absent_teacher: String,
    day: String,
    start: String,
    end: String,
    date: String,
    confirmation: Confirmation,
}

#[derive(Serialize)]
pub struct CountEntry {
    teacher: String,
    count: u32,
}

#[derive(Serialize)]
pub struct CatalogResponse {
    slots: Vec<String>,
    days: Vec<String>,
}

fn bad_request(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({"success": false, "error": message.into()}))
}

/// Checks a date string is `YYYY-MM-DD` and not before `today`.
pub fn validate_date(date: &str, today: NaiveDate) -> std::result::Result<(), String> {
    let parsed = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map_err(|_| format!("Invalid date {:?}, expected YYYY-MM-DD", date))?;
    if parsed < today {
        return Err("Date cannot be in the past".to_string());
    }
    Ok(())
}

/// Validates a proposal request and resolves it into an absence plus its date
pub fn validate_proposal(
    req: &ProposalRequest,
    config: &AppConfig,
    today: NaiveDate,
) -> std::result::Result<(AbsenceRequest, String), String> {
    let absent = req.absent_teacher.as_deref().map(str::trim).unwrap_or("");
    let day = req.day.as_deref().map(str::trim).unwrap_or("");
    if absent.is_empty() || day.is_empty() {
        return Err("Absent teacher and day are required".to_string());
    }
    if !config.is_working_day(day) {
        return Err(format!("Unknown day {:?}", day));
    }

    let date = req.date.as_deref().map(str::trim).unwrap_or("");
    if date.is_empty() {
        return Err("A date is required".to_string());
    }
    validate_date(date, today)?;

    let (start, end) = if req.full_day {
        let (first, last) = config
            .catalog
            .full_day()
            .ok_or_else(|| "No slots are configured".to_string())?;
        (first.to_string(), last.to_string())
    } else {
        match (req.start.as_deref(), req.end.as_deref()) {
            (Some(start), Some(end)) if !start.trim().is_empty() && !end.trim().is_empty() => {
                (start.trim().to_string(), end.trim().to_string())
            }
            _ => return Err("Start and end slots are required unless full_day is set".to_string()),
        }
    };

    if let Err(err) = config.catalog.resolve_range(&start, &end) {
        return Err(err.to_string());
    }

    Ok((AbsenceRequest::new(absent, day, start, end), date.to_string()))
}

// Admin login endpoint
async fn admin_login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if req.password == state.config.admin_password {
        Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
    } else {
        Ok(HttpResponse::Unauthorized().json(serde_json::json!({"success": false, "error": "Invalid password"})))
    }
}

// Schedule upload: JSON collection, or CSV when the content type says so
async fn upload_schedules(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let password = req
        .headers()
        .get("X-Admin-Password")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if password != state.config.admin_password {
        return Ok(HttpResponse::Unauthorized().json(serde_json::json!({"success": false, "error": "Unauthorized"})));
    }

    let is_csv = req
        .headers()
        .get("Content-Type")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("csv"))
        .unwrap_or(false);

    let parsed = if is_csv {
        parse_schedules_csv(body.as_ref()).map_err(|e| e.to_string())
    } else {
        serde_json::from_slice::<Vec<TeacherSchedule>>(&body).map_err(|e| e.to_string())
    };

    let schedules = match parsed {
        Ok(schedules) if !schedules.is_empty() => schedules,
        Ok(_) => return Ok(bad_request("No schedules found in upload")),
        Err(e) => {
            warn!(error = %e, "rejected schedule upload");
            return Ok(bad_request(format!("Failed to process schedules: {}", e)));
        }
    };

    if let Err(e) = state.store.save_schedules(&schedules) {
        error!(error = %e, "failed to save schedules");
        return Err(actix_web::error::ErrorInternalServerError(format!("Failed to save schedules: {}", e)));
    }

    let count = schedules.len();
    *lock(&state.schedules) = schedules;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "teachers": count
    })))
}

async fn list_teachers(state: web::Data<AppState>) -> Result<HttpResponse> {
    let schedules = lock(&state.schedules);
    let mut names: Vec<String> = schedules
        .iter()
        .map(|s| s.teacher_name.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    names.sort();
    names.dedup();
    Ok(HttpResponse::Ok().json(names))
}

async fn get_catalog(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(CatalogResponse {
        slots: state.config.catalog.labels().to_vec(),
        days: state.config.days.clone(),
    }))
}

async fn propose(
    req: web::Json<ProposalRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let today = Local::now().date_naive();
    let (request, date) = match validate_proposal(&req, &state.config, today) {
        Ok(valid) => valid,
        Err(message) => return Ok(bad_request(message)),
    };

    let schedules = lock(&state.schedules);
    if schedules.is_empty() {
        return Ok(bad_request("No schedules loaded"));
    }

    // Counters are only read here; the lock is released before returning.
    let result = {
        let ledger = lock(&state.ledger);
        plan_absence(&schedules, &request, &state.config.catalog, ledger.counters())
    };

    info!(absent = %request.absent_teacher, day = %request.day, outcome = %result, "proposal computed");
    Ok(HttpResponse::Ok().json(ProposalResponse {
        needs_external_staff: result.needs_external_staff(),
        request,
        date,
        result,
    }))
}

async fn confirm(
    req: web::Json<ConfirmationRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    if req.absent_teacher.trim().is_empty() || req.day.trim().is_empty() {
        return Ok(bad_request("Absent teacher and day are required"));
    }
    if !state.config.is_working_day(&req.day) {
        return Ok(bad_request(format!("Unknown day {:?}", req.day)));
    }
    if let Err(message) = validate_date(&req.date, Local::now().date_naive()) {
        return Ok(bad_request(message));
    }

    let request = AbsenceRequest::new(req.absent_teacher, req.day, req.start, req.end);
    let mut ledger = lock(&state.ledger);
    let summary = match commit(
        &mut *ledger,
        &request,
        &req.date,
        &req.confirmation,
        &state.config.catalog,
        Local::now().naive_local(),
    ) {
        Ok(summary) => summary,
        Err(e) => return Ok(bad_request(e.to_string())),
    };

    if let Err(e) = ledger.flush() {
        error!(error = %e, "failed to persist workload ledger");
        return Err(actix_web::error::ErrorInternalServerError(format!("Failed to save substitution: {}", e)));
    }

    Ok(HttpResponse::Ok().json(summary))
}

async fn get_counts(state: web::Data<AppState>) -> Result<HttpResponse> {
    let ledger = lock(&state.ledger);
    let counts: Vec<CountEntry> = ledger
        .counters()
        .ranked()
        .into_iter()
        .map(|(teacher, count)| CountEntry { teacher, count })
        .collect();
    Ok(HttpResponse::Ok().json(counts))
}

async fn get_history(state: web::Data<AppState>) -> Result<HttpResponse> {
    let ledger = lock(&state.ledger);
    Ok(HttpResponse::Ok().json(ledger.history()))
}

/// Registers every API route
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/login", web::post().to(admin_login))
        .route("/api/schedules", web::post().to(upload_schedules))
        .route("/api/teachers", web::get().to(list_teachers))
        .route("/api/catalog", web::get().to(get_catalog))
        .route("/api/proposals", web::post().to(propose))
        .route("/api/confirmations", web::post().to(confirm))
        .route("/api/counts", web::get().to(get_counts))
        .route("/api/history", web::get().to(get_history));
}

pub async fn start_server(config: AppConfig) -> std::io::Result<()> {
    let port = config.port;
    let state = AppState::load(config).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    let app_state = web::Data::new(state);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(routes)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
