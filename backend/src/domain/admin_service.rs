use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::AdminConfig;
use crate::domain::commands::admin::{AdminLoginCommand, UpdateDashboardQueryCommand};
use crate::domain::list_query::{AdminQueryView, QueryPage};
use crate::domain::models::{AdminSession, Student};
use crate::storage::traits::StudentStorage;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdminError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Admin login required")]
    Unauthorized,
    #[error("Admin session has expired, please log in again")]
    SessionExpired,
    #[error("Student not found: {0}")]
    StudentNotFound(String),
    #[error("Failed to load student: {0}")]
    Storage(String),
}

/// A logged-in admin and the record list they are looking at
struct Dashboard {
    session: AdminSession,
    view: AdminQueryView,
}

/// Admin login plus the per-session dashboard state.
///
/// The record list is fetched once at login (and again on reload); search,
/// filters and paging then run over that snapshot.
#[derive(Clone)]
pub struct AdminService {
    config: AdminConfig,
    students: Arc<dyn StudentStorage>,
    dashboards: Arc<RwLock<HashMap<String, Dashboard>>>,
}

impl AdminService {
    pub fn new(config: AdminConfig, students: Arc<dyn StudentStorage>) -> Self {
        Self {
            config,
            students,
            dashboards: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// A failed fetch shows an empty dashboard rather than an error page
    async fn load_students(&self) -> Vec<Student> {
        match self.students.list_students().await {
            Ok(students) => {
                info!("Loaded {} student records for the dashboard", students.len());
                students
            }
            Err(e) => {
                error!("Error loading students: {:#}", e);
                Vec::new()
            }
        }
    }

    pub async fn login(&self, command: AdminLoginCommand, now: DateTime<Utc>) -> Result<AdminSession, AdminError> {
        if command.username != self.config.username || command.password != self.config.password {
            warn!("Rejected admin login for '{}'", command.username);
            return Err(AdminError::InvalidCredentials);
        }

        let session = AdminSession::new(Uuid::new_v4().to_string(), now, self.config.session_ttl());
        let view = AdminQueryView::new(self.load_students().await);

        let mut dashboards = self.dashboards.write().await;
        let before = dashboards.len();
        dashboards.retain(|_, dashboard| dashboard.session.is_valid_at(now));
        if dashboards.len() < before {
            info!("Dropped {} expired admin sessions", before - dashboards.len());
        }
        dashboards.insert(
            session.token.clone(),
            Dashboard {
                session: session.clone(),
                view,
            },
        );
        drop(dashboards);

        info!("Admin logged in, session valid until {}", session.expires_at);
        Ok(session)
    }

    pub async fn logout(&self, token: &str) -> Result<(), AdminError> {
        match self.dashboards.write().await.remove(token) {
            Some(_) => {
                info!("Admin logged out");
                Ok(())
            }
            None => Err(AdminError::Unauthorized),
        }
    }

    /// Check that `token` names a live session; expired sessions are dropped
    pub async fn authorize(&self, token: &str, now: DateTime<Utc>) -> Result<AdminSession, AdminError> {
        let mut dashboards = self.dashboards.write().await;
        let dashboard = dashboards.get(token).ok_or(AdminError::Unauthorized)?;

        if dashboard.session.is_valid_at(now) {
            return Ok(dashboard.session.clone());
        }

        dashboards.remove(token);
        info!("Admin session expired and was removed");
        Err(AdminError::SessionExpired)
    }

    /// Run `f` against the caller's dashboard after checking the session
    async fn with_dashboard<T>(
        &self,
        token: &str,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut AdminQueryView) -> T,
    ) -> Result<T, AdminError> {
        self.authorize(token, now).await?;
        let mut dashboards = self.dashboards.write().await;
        // Logged out between the two locks
        let dashboard = dashboards.get_mut(token).ok_or(AdminError::Unauthorized)?;
        Ok(f(&mut dashboard.view))
    }

    pub async fn dashboard(&self, token: &str, now: DateTime<Utc>, today: NaiveDate) -> Result<QueryPage, AdminError> {
        self.with_dashboard(token, now, |view| view.query(today)).await
    }

    /// Fetch the record list again. Filters stay, the page goes back to 1.
    pub async fn reload(&self, token: &str, now: DateTime<Utc>, today: NaiveDate) -> Result<QueryPage, AdminError> {
        self.authorize(token, now).await?;
        let students = self.load_students().await;
        self.with_dashboard(token, now, |view| {
            view.replace_students(students);
            view.query(today)
        })
        .await
    }

    pub async fn update_query(
        &self,
        token: &str,
        command: UpdateDashboardQueryCommand,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<QueryPage, AdminError> {
        self.with_dashboard(token, now, |view| {
            if let Some(search) = command.search {
                view.set_search(search);
            }
            if let Some(grade) = command.grade {
                view.set_grade_filter(grade);
            }
            if let Some(blood_group) = command.blood_group {
                view.set_blood_group_filter(blood_group);
            }
            view.query(today)
        })
        .await
    }

    pub async fn set_page(&self, token: &str, page: u32, now: DateTime<Utc>, today: NaiveDate) -> Result<QueryPage, AdminError> {
        self.with_dashboard(token, now, |view| {
            view.set_page(page);
            view.query(today)
        })
        .await
    }

    #[cfg(test)]
    pub(crate) async fn dashboard_count(&self) -> usize {
        self.dashboards.read().await.len()
    }

    /// Full record for the detail dialog, read fresh from storage
    pub async fn student_detail(&self, token: &str, student_id: &str, now: DateTime<Utc>) -> Result<Student, AdminError> {
        self.authorize(token, now).await?;

        match self.students.get_student(student_id).await {
            Ok(Some(student)) => Ok(student),
            Ok(None) => Err(AdminError::StudentNotFound(student_id.to_string())),
            Err(e) => {
                error!("Error loading student {}: {:#}", student_id, e);
                Err(AdminError::Storage(format!("{:#}", e)))
            }
        }
    }
}
