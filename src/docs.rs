use crate::api::payroll::{
    ApprovePayroll, ApprovePerson, ApprovePersonResponse, HistoryQuery, HistoryResponse,
    PeriodQuery, PreviewResponse,
};
use crate::api::personnel::{PersonnelListResponse, PersonnelResponse};
use crate::model::payroll::{
    EntryStatus, PayrollEntry, PayrollRun, PayrollRunSummary, PayrollTotals,
};
use crate::model::personnel::{PersonnelDetails, PersonnelRecord};
use crate::models::{LoginReq, SignupReq};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Payroll API",
        version = "1.0.0",
        description = r#"
## Personnel Payroll

Computes and approves per-period payroll runs for a military personnel roster.

### Key Features
- **Roster**
  - Add, update, list and remove personnel; legacy spreadsheet field names are accepted
- **Payroll**
  - Preview a period without storing anything
  - Approve a whole period, optionally overwriting an earlier run
  - Approve one person into a period's run
  - Fetch a run and browse approval history

### Security
All `/api` endpoints require a **JWT Bearer** token from `/auth/login`.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::signup,
        crate::auth::handlers::login,
        crate::auth::handlers::profile,
        crate::auth::handlers::logout,

        crate::api::personnel::list_personnel,
        crate::api::personnel::get_personnel,
        crate::api::personnel::add_personnel,
        crate::api::personnel::update_personnel,
        crate::api::personnel::delete_personnel,

        crate::api::payroll::preview_payroll,
        crate::api::payroll::approve_payroll,
        crate::api::payroll::approve_person,
        crate::api::payroll::get_payroll_run,
        crate::api::payroll::list_payroll_history
    ),
    components(
        schemas(
            SignupReq,
            LoginReq,
            PersonnelDetails,
            PersonnelRecord,
            PersonnelListResponse,
            PersonnelResponse,
            EntryStatus,
            PayrollEntry,
            PayrollTotals,
            PayrollRun,
            PayrollRunSummary,
            PeriodQuery,
            HistoryQuery,
            ApprovePayroll,
            ApprovePerson,
            PreviewResponse,
            ApprovePersonResponse,
            HistoryResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Accounts and tokens"),
        (name = "Personnel", description = "Roster management APIs"),
        (name = "Payroll", description = "Payroll preview, approval and history APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
