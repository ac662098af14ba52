use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use schoolbus_desk::api::{AuthFlow, HttpBackend, RegistrationForm};
use schoolbus_desk::config::AppConfig;
use schoolbus_desk::controller::{
    AdminAction, AdminDashboard, BusForm, Clock, ComplaintForm, InchargeAction, InchargeDashboard, Outcome,
    StatusUpdateForm, StudentAction, StudentDashboard, StudentForm, SystemClock,
};
use schoolbus_desk::export::{export_to_file, write_export, OutputFormat};
use schoolbus_desk::logging::{init_logging, OperationTimer};
use schoolbus_desk::models::{ComplaintStatus, FeeStatus, Role};
use schoolbus_desk::seed::ensure_seeded;
use schoolbus_desk::session::{SessionGuard, SessionPolicy};
use schoolbus_desk::storage::Store;
use schoolbus_desk::timers::{Debouncer, Ticker};
use schoolbus_desk::view::filter::{attendance_code, filter_attendance, filter_complaints, filter_students, StatusFilter};
use schoolbus_desk::view::paginate::paginate;
use schoolbus_desk::view::time::relative_time;
use schoolbus_desk::view::{Page, Region};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Data directory (overrides config and SCHOOLBUS_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Session policy (permissive-demo or strict-redirect)
    #[arg(long, global = true)]
    policy: Option<SessionPolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the demo dataset into absent collections
    Seed,
    /// Remove every collection and the session
    Reset,
    /// Manage students (admin)
    Students {
        #[command(subcommand)]
        command: StudentCommands,
    },
    /// Manage buses (admin)
    Buses {
        #[command(subcommand)]
        command: BusCommands,
    },
    /// Send the fee reminder to every defaulter
    NotifyDefaulters {
        /// Message to send instead of the default reminder
        #[arg(short, long)]
        message: Option<String>,
    },
    /// List, submit and update complaints
    Complaints {
        #[command(subcommand)]
        command: ComplaintCommands,
    },
    /// List or mark attendance
    Attendance {
        #[command(subcommand)]
        command: AttendanceCommands,
    },
    /// Render a dashboard as an HTML document
    Render {
        /// admin, incharge or student
        dashboard: Role,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Student search term (admin)
        #[arg(short, long)]
        search: Option<String>,

        /// Students page (admin)
        #[arg(short, long)]
        page: Option<usize>,
    },
    /// Re-render a dashboard to a file on every clock tick
    Watch {
        dashboard: Role,

        #[arg(short, long)]
        out: PathBuf,
    },
    /// Search students interactively, one term per line on stdin
    Search,
    /// Log in against the backend API
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(short, long, default_value = "student")]
        role: Role,
    },
    /// Register a student account against the backend API
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long, default_value = "")]
        phone: String,

        #[arg(long, default_value = "")]
        student_id: String,

        /// Bus route id; omit to list the available routes
        #[arg(long)]
        bus_id: Option<String>,

        #[arg(long)]
        password: String,

        #[arg(long)]
        confirm_password: String,
    },
    /// Clear the session
    Logout,
    /// Export the store
    Export {
        /// json (all collections) or csv (student roster)
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
enum StudentCommands {
    List {
        #[arg(short, long, default_value = "")]
        search: String,

        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long, default_value = "")]
        phone: String,

        /// Bus id or bus number
        #[arg(long)]
        bus: Option<String>,

        #[arg(long)]
        fee: Option<FeeStatus>,
    },
    Edit {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        /// Bus id or bus number; "none" detaches the student
        #[arg(long)]
        bus: Option<String>,

        #[arg(long)]
        fee: Option<FeeStatus>,
    },
    Delete {
        id: String,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Queue a notification for one student
    Notify {
        id: String,

        #[arg(short, long)]
        message: Option<String>,
    },
}

#[derive(Subcommand)]
enum BusCommands {
    List,
    Add {
        #[arg(long)]
        number: String,

        #[arg(long)]
        route: String,

        #[arg(long, default_value = "")]
        capacity: String,

        #[arg(long)]
        incharge: Option<String>,
    },
    Edit {
        id: String,

        #[arg(long)]
        number: Option<String>,

        #[arg(long)]
        route: Option<String>,

        #[arg(long)]
        capacity: Option<String>,

        #[arg(long)]
        incharge: Option<String>,
    },
    /// Delete a bus; its students are detached
    Delete {
        id: String,

        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ComplaintCommands {
    List {
        /// all, Submitted, "In Progress" or Resolved
        #[arg(short, long, default_value = "all")]
        status: StatusFilter,
    },
    Submit {
        #[arg(long)]
        subject: String,

        #[arg(long)]
        description: String,
    },
    Update {
        id: String,

        #[arg(long)]
        status: ComplaintStatus,

        #[arg(long, default_value = "")]
        notes: String,
    },
}

#[derive(Subcommand)]
enum AttendanceCommands {
    List {
        /// Local calendar date (YYYY-MM-DD); all dates when omitted
        #[arg(short, long)]
        date: Option<NaiveDate>,

        #[arg(short, long, default_value = "")]
        search: String,
    },
    Mark {
        /// Scanned QR payload
        #[arg(long, conflicts_with = "code")]
        qr: Option<String>,

        /// Manually typed code
        #[arg(long)]
        code: Option<String>,
    },
}

/// Shared handles for one CLI invocation
struct Desk {
    config: AppConfig,
    store: Store,
    guard: SessionGuard,
    clock: Arc<dyn Clock>,
}

impl Desk {
    fn admin(&self) -> Result<AdminDashboard> {
        let (dashboard, outcome) = AdminDashboard::open(
            &self.guard,
            self.store.clone(),
            Page::for_dashboard(Role::Admin),
            self.config.view.clone(),
            Arc::clone(&self.clock),
        )
        .context("Failed to open admin dashboard")?;
        report(&outcome)?;
        Ok(dashboard)
    }

    fn incharge(&self) -> Result<InchargeDashboard> {
        let (dashboard, outcome) = InchargeDashboard::open(
            &self.guard,
            self.store.clone(),
            Page::for_dashboard(Role::Incharge),
            self.config.view.clone(),
            Arc::clone(&self.clock),
        )
        .context("Failed to open bus in-charge dashboard")?;
        report(&outcome)?;
        Ok(dashboard)
    }

    fn student(&self) -> Result<StudentDashboard> {
        let (dashboard, outcome) = StudentDashboard::open(
            &self.guard,
            self.store.clone(),
            Page::for_dashboard(Role::Student),
            self.config.view.clone(),
            Arc::clone(&self.clock),
        )
        .context("Failed to open student dashboard")?;
        report(&outcome)?;
        Ok(dashboard)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = AppConfig::load().context("Failed to load configuration")?;
    if let Some(policy) = cli.policy {
        config.session.policy = policy;
    }

    // Initialize logging
    let _log_guard = init_logging(
        Some(&config.get_log_level()),
        &config.logging.format,
        config.logging.file_path.as_deref().map(Path::new),
    )?;

    let data_dir = cli.data_dir.clone().unwrap_or_else(|| config.data_dir());
    info!(data_dir = %data_dir.display(), policy = %config.session.policy, "Starting schoolbus-desk");

    let store = Store::open(&data_dir)
        .with_context(|| format!("Failed to open store at {}", data_dir.display()))?
        .with_attendance_cap(config.storage.attendance_cap);
    let guard = SessionGuard::new(
        store.clone(),
        config.session.policy,
        config.session.landing_page.clone(),
        config.session.demo_token.clone(),
    );
    let desk = Desk {
        config,
        store,
        guard,
        clock: Arc::new(SystemClock),
    };

    let timer = OperationTimer::new("command");
    match cli.command {
        Commands::Seed => {
            let seeded = ensure_seeded(&desk.store, desk.clock.now())?;
            if seeded.is_noop() {
                println!("All collections already present");
            } else {
                let names: Vec<_> = seeded.seeded.iter().map(ToString::to_string).collect();
                println!("Seeded: {}", names.join(", "));
            }
        }
        Commands::Reset => {
            desk.store.clear_all()?;
            println!("All local data cleared");
        }
        Commands::Students { command } => students(&desk, command)?,
        Commands::Buses { command } => buses(&desk, command)?,
        Commands::NotifyDefaulters { message } => {
            let mut admin = desk.admin()?;
            report(&admin.dispatch(AdminAction::NotifyDefaulters)?)?;
            let recipients = admin.compose().recipients.clone();
            if recipients.is_empty() {
                println!("No fee defaulters");
            } else {
                let message = message.unwrap_or_else(|| admin.compose().message.clone());
                report(&admin.dispatch(AdminAction::SendNotification { recipients, message })?)?;
            }
        }
        Commands::Complaints { command } => complaints(&desk, command)?,
        Commands::Attendance { command } => attendance(&desk, command)?,
        Commands::Render {
            dashboard,
            out,
            search,
            page,
        } => {
            let document = render_document(&desk, dashboard, search, page)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, document).with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Rendered {dashboard} dashboard to {}", path.display());
                }
                None => print!("{document}"),
            }
        }
        Commands::Watch { dashboard, out } => watch(&desk, dashboard, &out).await?,
        Commands::Search => search(&desk).await?,
        Commands::Login { email, password, role } => {
            let flow = AuthFlow::new(HttpBackend::new(&desk.config.api)?, desk.guard.clone());
            let page = flow.login(&email, &password, role).await?;
            println!("Logged in; open {page}");
        }
        Commands::Register {
            name,
            email,
            phone,
            student_id,
            bus_id,
            password,
            confirm_password,
        } => {
            let flow = AuthFlow::new(HttpBackend::new(&desk.config.api)?, desk.guard.clone());
            let Some(bus_id) = bus_id else {
                let routes = flow.bus_routes().await;
                if routes.is_empty() {
                    bail!("No bus routes available; pass --bus-id");
                }
                println!("Choose a route with --bus-id:");
                for route in routes {
                    println!("  {}  {}", route.id, route.label());
                }
                return Ok(());
            };
            let form = RegistrationForm {
                name,
                email,
                phone,
                student_id,
                bus_id,
                password,
                confirm_password,
            };
            let page = flow.register(&form).await?;
            println!("Registration successful! Continue at {page}");
        }
        Commands::Logout => {
            let landing = desk.guard.logout()?;
            println!("Logged out; open {landing}");
        }
        Commands::Export { format, out } => match out {
            Some(path) => {
                export_to_file(&desk.store, format, &path, Utc::now())?;
                println!("Exported {format} to {}", path.display());
            }
            None => write_export(&desk.store, format, std::io::stdout().lock(), Utc::now())?,
        },
        Commands::Config => print!("{}", desk.config.to_yaml()?),
    }
    timer.finish();

    Ok(())
}

/// Print notices; a failed form validation becomes the command's error.
fn report(outcome: &Outcome) -> Result<()> {
    for notice in &outcome.notices {
        println!("{notice}");
    }
    if outcome.is_valid() {
        return Ok(());
    }
    let markers: Vec<String> = outcome
        .field_errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect();
    Err(anyhow!("Validation failed: {}", markers.join("; ")))
}

/// Resolve `--bus` given as an id or a bus number.
fn resolve_bus(admin: &AdminDashboard, bus: &str) -> Result<Option<String>> {
    if bus.eq_ignore_ascii_case("none") || bus.is_empty() {
        return Ok(None);
    }
    admin
        .buses()
        .iter()
        .find(|b| b.id == bus || b.bus_number.eq_ignore_ascii_case(bus))
        .map(|b| Some(b.id.clone()))
        .ok_or_else(|| anyhow!("No bus matches {bus:?}"))
}

fn students(desk: &Desk, command: StudentCommands) -> Result<()> {
    let mut admin = desk.admin()?;
    match command {
        StudentCommands::List { search, page } => {
            let filtered = filter_students(admin.students(), &search);
            let window = paginate(filtered.len(), page, desk.config.view.student_page_size);
            for s in window.slice(&filtered) {
                let marker = if s.is_defaulter() { "!" } else { " " };
                println!(
                    "{marker} {:<8} {:<20} {:<28} {:<10} {:<8} {}",
                    s.student_id,
                    s.name,
                    s.email,
                    s.bus_number,
                    s.fee_status.label(),
                    s.id
                );
            }
            println!("{} (page {} of {})", window.info_label("No students"), window.page, window.pages);
        }
        StudentCommands::Add {
            name,
            email,
            phone,
            bus,
            fee,
        } => {
            let bus_id = bus.as_deref().map(|b| resolve_bus(&admin, b)).transpose()?.flatten();
            admin.dispatch(AdminAction::OpenCreateStudent)?;
            let form = StudentForm {
                name,
                email,
                phone,
                bus_id,
                fee_status: fee,
            };
            report(&admin.dispatch(AdminAction::SubmitStudent(form))?)?;
        }
        StudentCommands::Edit {
            id,
            name,
            email,
            phone,
            bus,
            fee,
        } => {
            report(&admin.dispatch(AdminAction::EditStudent(id.clone()))?)?;
            let mut form = admin
                .student_prefill()
                .ok_or_else(|| anyhow!("Student not found: {id}"))?;
            if let Some(bus) = bus {
                form.bus_id = resolve_bus(&admin, &bus)?;
            }
            form.name = name.unwrap_or(form.name);
            form.email = email.unwrap_or(form.email);
            form.phone = phone.unwrap_or(form.phone);
            form.fee_status = fee.or(form.fee_status);
            report(&admin.dispatch(AdminAction::SubmitStudent(form))?)?;
        }
        StudentCommands::Delete { id, yes } => {
            report(&admin.dispatch(AdminAction::RequestDeleteStudent(id))?)?;
            confirm(&mut admin, yes)?;
        }
        StudentCommands::Notify { id, message } => {
            report(&admin.dispatch(AdminAction::NotifyStudent(id))?)?;
            let recipients = admin.compose().recipients.clone();
            if recipients.is_empty() {
                return Ok(());
            }
            let message = message.unwrap_or_else(|| admin.compose().message.clone());
            report(&admin.dispatch(AdminAction::SendNotification { recipients, message })?)?;
        }
    }
    Ok(())
}

/// Confirm or cancel the pending delete
fn confirm(admin: &mut AdminDashboard, yes: bool) -> Result<()> {
    if admin.pending_delete().is_none() {
        return Ok(());
    }
    if yes {
        report(&admin.dispatch(AdminAction::ConfirmDelete)?)
    } else {
        admin.dispatch(AdminAction::CancelDelete)?;
        println!("Cancelled; pass --yes to delete");
        Ok(())
    }
}

fn buses(desk: &Desk, command: BusCommands) -> Result<()> {
    let mut admin = desk.admin()?;
    match command {
        BusCommands::List => {
            for b in admin.buses() {
                println!(
                    "{:<10} {:<24} {:>4}  {:<16} {}",
                    b.bus_number,
                    b.route,
                    b.capacity,
                    b.incharge_name.as_deref().unwrap_or("Not Assigned"),
                    b.id
                );
            }
            println!("{} bus(es)", admin.buses().len());
        }
        BusCommands::Add {
            number,
            route,
            capacity,
            incharge,
        } => {
            admin.dispatch(AdminAction::OpenCreateBus)?;
            let form = BusForm {
                bus_number: number,
                route,
                capacity,
                incharge_name: incharge,
            };
            report(&admin.dispatch(AdminAction::SubmitBus(form))?)?;
        }
        BusCommands::Edit {
            id,
            number,
            route,
            capacity,
            incharge,
        } => {
            report(&admin.dispatch(AdminAction::EditBus(id.clone()))?)?;
            let mut form = admin.bus_prefill().ok_or_else(|| anyhow!("Bus not found: {id}"))?;
            form.bus_number = number.unwrap_or(form.bus_number);
            form.route = route.unwrap_or(form.route);
            form.capacity = capacity.unwrap_or(form.capacity);
            form.incharge_name = incharge.or(form.incharge_name);
            report(&admin.dispatch(AdminAction::SubmitBus(form))?)?;
        }
        BusCommands::Delete { id, yes } => {
            report(&admin.dispatch(AdminAction::RequestDeleteBus(id))?)?;
            confirm(&mut admin, yes)?;
        }
    }
    Ok(())
}

fn complaints(desk: &Desk, command: ComplaintCommands) -> Result<()> {
    match command {
        ComplaintCommands::List { status } => {
            let incharge = desk.incharge()?;
            let now = Utc::now();
            for c in filter_complaints(incharge.complaints(), status) {
                println!(
                    "{:<12} {:<12} {:<24} {:>8}  {}",
                    c.id,
                    c.status.label(),
                    c.subject,
                    relative_time(c.created_at, now),
                    c.notes.as_deref().unwrap_or("")
                );
            }
        }
        ComplaintCommands::Submit { subject, description } => {
            let mut student = desk.student()?;
            report(&student.dispatch(StudentAction::SubmitComplaint(ComplaintForm { subject, description }))?)?;
        }
        ComplaintCommands::Update { id, status, notes } => {
            let mut incharge = desk.incharge()?;
            report(&incharge.dispatch(InchargeAction::OpenComplaint(id))?)?;
            if incharge.open_complaint().is_some() {
                report(&incharge.dispatch(InchargeAction::SaveComplaintStatus(StatusUpdateForm { status, notes }))?)?;
            }
        }
    }
    Ok(())
}

fn attendance(desk: &Desk, command: AttendanceCommands) -> Result<()> {
    match command {
        AttendanceCommands::List { date, search } => {
            let student = desk.student()?;
            let marks = filter_attendance(student.attendance(), date, &search);
            for e in &marks {
                println!(
                    "{:<9} {}  {:<8} {:<7} {}",
                    attendance_code(e),
                    e.ts.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S"),
                    e.status.label(),
                    e.mode.label(),
                    e.raw.as_deref().unwrap_or("")
                );
            }
            println!("{} record(s)", marks.len());
        }
        AttendanceCommands::Mark { qr, code } => {
            let mut student = desk.student()?;
            let action = match (qr, code) {
                (Some(payload), _) => StudentAction::MarkAttendanceQr(payload),
                (None, Some(code)) => StudentAction::MarkAttendanceManual(code),
                (None, None) => bail!("Pass --qr <payload> or --code <code>"),
            };
            report(&student.dispatch(action)?)?;
        }
    }
    Ok(())
}

fn render_document(desk: &Desk, dashboard: Role, search: Option<String>, page: Option<usize>) -> Result<String> {
    Ok(match dashboard {
        Role::Admin => {
            let mut admin = desk.admin()?;
            if let Some(term) = search {
                admin.dispatch(AdminAction::Search(term))?;
            }
            if let Some(page) = page {
                admin.dispatch(AdminAction::GoToPage(page))?;
            }
            admin.page().to_document("Admin Dashboard")
        }
        Role::Incharge => desk.incharge()?.page().to_document("Bus In-charge Dashboard"),
        Role::Student => desk.student()?.page().to_document("Student Dashboard"),
    })
}

async fn watch(desk: &Desk, dashboard: Role, out: &Path) -> Result<()> {
    enum Open {
        Admin(AdminDashboard),
        Incharge(InchargeDashboard),
        Student(StudentDashboard),
    }

    let mut open = match dashboard {
        Role::Admin => Open::Admin(desk.admin()?),
        Role::Incharge => Open::Incharge(desk.incharge()?),
        Role::Student => Open::Student(desk.student()?),
    };
    let write = |open: &Open| -> Result<()> {
        let document = match open {
            Open::Admin(d) => d.page().to_document("Admin Dashboard"),
            Open::Incharge(d) => d.page().to_document("Bus In-charge Dashboard"),
            Open::Student(d) => d.page().to_document("Student Dashboard"),
        };
        std::fs::write(out, document).with_context(|| format!("Failed to write {}", out.display()))
    };
    write(&open)?;

    let (ticker, mut ticks) = Ticker::channel(Duration::from_secs(desk.config.view.clock_tick_secs));
    println!("Watching {dashboard} dashboard into {}; Ctrl-C to stop", out.display());
    loop {
        tokio::select! {
            Some(_) = ticks.recv() => {
                match &mut open {
                    Open::Admin(d) => { d.dispatch(AdminAction::Tick)?; }
                    Open::Incharge(d) => { d.dispatch(InchargeAction::Refresh)?; }
                    Open::Student(d) => { d.dispatch(StudentAction::Refresh)?; }
                }
                write(&open)?;
                debug!(dashboard = %dashboard, "dashboard re-rendered on tick");
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    ticker.stop();
    Ok(())
}

async fn search(desk: &Desk) -> Result<()> {
    let mut admin = desk.admin()?;
    let delay = Duration::from_millis(desk.config.view.search_debounce_ms);
    let (mut debouncer, mut terms) = Debouncer::channel(delay);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut eof = false;

    loop {
        tokio::select! {
            line = lines.next_line(), if !eof => match line? {
                Some(term) => debouncer.push(term),
                None => eof = true,
            },
            Some(term) = terms.recv() => {
                admin.dispatch(AdminAction::Search(term))?;
                let state = admin.list_state();
                let filtered = filter_students(admin.students(), &state.search);
                for s in filtered.iter().take(desk.config.view.student_page_size) {
                    println!("  {:<8} {:<20} {}", s.student_id, s.name, s.bus_number);
                }
                println!("{}", admin.page().get(Region::StudentsInfo).unwrap_or_default());
                if eof {
                    break;
                }
            }
            () = tokio::time::sleep(delay * 4), if eof => break,
        }
    }
    Ok(())
}
