//! The composition root for the reminder companion.
//!
//! A [`Session`] owns everything the timers and command handlers share:
//! the settings store, the prayer-time source, the cached day of timings and
//! every live timer handle. Front-ends talk to it through [`Command`] values
//! and [`Session::dispatch`].

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rusqlite::Connection;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::clock::Clock;
use crate::db::repository::{CacheRepo, PreferenceRepo};
use crate::error::AdhkarError;
use crate::models::dhikr::{builtin_duas, random_dua};
use crate::models::{
    CalculationMethod, DailyTimings, DisplayLanguage, Dua, Location, ReminderInterval,
};
use crate::notify::Notifier;
use crate::prayer_times::{NextPrayer, PrayerSource, next_prayer};
use crate::scheduler::notifications::NoticeAction;
use crate::scheduler::{
    MidnightRefresh, NotificationScheduler, ReminderScheduler, TimerHandle, action,
};
use crate::utils::format::format_duration_secs;

const STATUS_TICK: Duration = Duration::from_secs(60);

/// Everything the host UI can ask the session to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ShowDhikr,
    ShowTimes,
    Refresh,
    SetLocation(Location),
    SetMethod(CalculationMethod),
    SetInterval(ReminderInterval),
    SetNotificationLead(u32),
    SetLanguage(DisplayLanguage),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::ShowDhikr => "getDhikr",
            Command::ShowTimes => "showTimes",
            Command::Refresh => "refresh",
            Command::SetLocation(_) => "setLocation",
            Command::SetMethod(_) => "setMethod",
            Command::SetInterval(_) => "setInterval",
            Command::SetNotificationLead(_) => "setNotificationLead",
            Command::SetLanguage(_) => "setLanguage",
        }
    }

    /// Build a command from a message name and its string arguments. The
    /// `vsadhkar.` prefix used by editor command ids is accepted.
    pub fn from_name(name: &str, args: &[&str]) -> Result<Self, AdhkarError> {
        let name = name.strip_prefix("vsadhkar.").unwrap_or(name);
        let arg = |i: usize, setting: &'static str| nth_arg(args, i, setting);

        match name {
            "getDhikr" => Ok(Command::ShowDhikr),
            "showTimes" => Ok(Command::ShowTimes),
            "refresh" => Ok(Command::Refresh),
            "setLocation" => Ok(Command::SetLocation(Location::new(
                arg(0, "country")?,
                arg(1, "state")?,
                arg(2, "city")?,
            ))),
            "setMethod" => Ok(Command::SetMethod(arg(0, "calculation method")?.parse()?)),
            "setInterval" => Ok(Command::SetInterval(arg(0, "reminder interval")?.parse()?)),
            "setNotificationLead" => {
                let raw = arg(0, "notification lead")?;
                let minutes = raw
                    .trim()
                    .parse()
                    .map_err(|_| AdhkarError::invalid("notification lead", raw))?;
                Ok(Command::SetNotificationLead(minutes))
            }
            "setLanguage" => Ok(Command::SetLanguage(arg(0, "display language")?.parse()?)),
            other => Err(AdhkarError::invalid("command", other)),
        }
    }
}

/// What a dispatched command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    DhikrShown { dua: Dua, text: String },
    Times {
        timings: DailyTimings,
        next: Option<NextPrayer>,
    },
    Refreshed(DailyTimings),
    /// A newer fetch was started while this one was in flight.
    Superseded,
    SettingSaved(&'static str),
    Failed(String),
}

#[derive(Debug, Default)]
struct Timers {
    reminder: ReminderScheduler,
    midnight: Option<MidnightRefresh>,
    notifications: NotificationScheduler,
    status: Option<TimerHandle>,
}

pub struct Session {
    db: StdMutex<Connection>,
    clock: Arc<dyn Clock>,
    prayers: Arc<dyn PrayerSource>,
    notifier: Arc<dyn Notifier>,
    timings: RwLock<Option<DailyTimings>>,
    fetch_generation: AtomicU64,
    running: AtomicBool,
    timers: Mutex<Timers>,
    rng: StdMutex<StdRng>,
}

impl Session {
    pub fn new(
        conn: Connection,
        clock: Arc<dyn Clock>,
        prayers: Arc<dyn PrayerSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Arc<Self> {
        Arc::new(Self {
            db: StdMutex::new(conn),
            clock,
            prayers,
            notifier,
            timings: RwLock::new(None),
            fetch_generation: AtomicU64::new(0),
            running: AtomicBool::new(false),
            timers: Mutex::new(Timers::default()),
            rng: StdMutex::new(StdRng::from_entropy()),
        })
    }

    fn with_db<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.db.lock().unwrap_or_else(|e| e.into_inner());
        f(&conn)
    }

    fn report(&self, context: &str, err: &anyhow::Error) {
        warn!("{}: {:#}", context, err);
        self.notifier.warn(&format!("{}: {}", context, err));
    }

    pub fn now(&self) -> chrono::NaiveDateTime {
        self.clock.now()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    // ─── Lifecycle ──────────────────────────────────────────────────────────

    /// Arm every timer and load today's prayer times.
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);

        let interval = self.with_db(PreferenceRepo::reminder_interval)?;
        self.arm_reminder(interval).await;
        self.arm_midnight().await;
        self.arm_status().await;

        match self.load_or_refresh().await {
            Ok(Some(timings)) => {
                info!(
                    "Prayer times ready for {} ({})",
                    timings.location, timings.date
                );
                if let Err(e) = self.after_timings_changed().await {
                    self.report("Could not schedule prayer notices", &e);
                }
            }
            Ok(None) => {}
            Err(e) if is_incomplete_location(&e) => {
                self.notifier
                    .warn("No location set yet. Use `vsadhkar location` to pick one.");
            }
            Err(e) => self.report("Could not load prayer times", &e),
        }
        Ok(())
    }

    /// Cancel every timer. Returns how many were live.
    pub async fn shutdown(&self) -> usize {
        self.running.store(false, Ordering::SeqCst);
        let mut timers = self.timers.lock().await;

        let mut cancelled = usize::from(timers.reminder.cancel());
        if let Some(midnight) = timers.midnight.take() {
            midnight.cancel();
            cancelled += 1;
        }
        cancelled += timers.notifications.cancel_all();
        if let Some(status) = timers.status.take() {
            status.cancel();
            cancelled += 1;
        }
        info!("Session stopped, {} timer(s) cancelled", cancelled);
        cancelled
    }

    async fn arm_reminder(self: &Arc<Self>, interval: ReminderInterval) {
        let weak = Arc::downgrade(self);
        let act = action(move || {
            let weak = weak.clone();
            async move {
                if let Some(session) = weak.upgrade() {
                    if let Err(e) = session.show_dhikr() {
                        session.report("Could not show a reminder", &e);
                    }
                }
            }
        });
        self.timers.lock().await.reminder.arm(interval, act);
    }

    async fn arm_midnight(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let act = action(move || {
            let weak = weak.clone();
            async move {
                let Some(session) = weak.upgrade() else { return };
                info!("Daily prayer time refresh");
                if let Err(e) = session.refresh_prayer_times().await {
                    if !is_incomplete_location(&e) {
                        session.report("Daily prayer time refresh failed", &e);
                    }
                }
            }
        });

        let mut timers = self.timers.lock().await;
        if let Some(previous) = timers.midnight.take() {
            previous.cancel();
        }
        timers.midnight = Some(MidnightRefresh::start(self.clock.now(), act));
    }

    async fn arm_status(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let first = Instant::now() + STATUS_TICK;
        let handle = TimerHandle::spawn(async move {
            let mut ticker = interval_at(first, STATUS_TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(session) = weak.upgrade() else { return };
                session.publish_status().await;
            }
        });

        let mut timers = self.timers.lock().await;
        if let Some(previous) = timers.status.replace(handle) {
            previous.cancel();
        }
    }

    async fn reschedule_notifications(self: &Arc<Self>) -> Result<usize> {
        if !self.is_running() {
            return Ok(0);
        }
        let lead = self.with_db(PreferenceRepo::notification_lead)?;
        let guard = self.timings.read().await;
        let mut timers = self.timers.lock().await;

        let Some(timings) = guard.as_ref() else {
            timers.notifications.cancel_all();
            return Ok(0);
        };

        let weak: Weak<Session> = Arc::downgrade(self);
        let notify: NoticeAction = Arc::new(move |prayer| {
            let weak = weak.clone();
            Box::pin(async move {
                if let Some(session) = weak.upgrade() {
                    session
                        .notifier
                        .info(&format!("{} in {} minutes", prayer, lead));
                }
            })
        });
        Ok(timers
            .notifications
            .schedule(&timings.times, lead, self.clock.now(), notify))
    }

    // ─── Prayer times ───────────────────────────────────────────────────────

    fn preferences(&self) -> Result<(Location, CalculationMethod)> {
        self.with_db(|conn| {
            Ok((
                PreferenceRepo::location(conn)?,
                PreferenceRepo::calc_method(conn)?,
            ))
        })
    }

    /// Today's timings from memory, then the database, then the network.
    /// `Ok(None)` means a newer fetch superseded this one.
    pub async fn load_or_refresh(self: &Arc<Self>) -> Result<Option<DailyTimings>> {
        let (location, method) = self.preferences()?;
        location.require_complete()?;
        let today = self.clock.now().date();

        if let Some(current) = self.current_timings().await {
            if current.date == today && current.location == location && current.method == method
            {
                return Ok(Some(current));
            }
        }

        let stored = self.with_db(|conn| CacheRepo::get_timings(conn, today, &location, method))?;
        if let Some(stored) = stored {
            debug!("Prayer times for {} loaded from local cache", today);
            self.install_timings(stored.clone()).await?;
            return Ok(Some(stored));
        }

        self.refresh_prayer_times().await
    }

    /// Fetch today's timings for the saved location and method.
    pub async fn refresh_prayer_times(self: &Arc<Self>) -> Result<Option<DailyTimings>> {
        let (location, method) = self.preferences()?;
        location.require_complete()?;

        let generation = self.fetch_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let today: NaiveDate = self.clock.now().date();
        let fetched = self
            .prayers
            .fetch_timings(&location, method, today)
            .await
            .with_context(|| format!("Fetching prayer times for {}", location))?;

        {
            let mut current = self.timings.write().await;
            if self.fetch_generation.load(Ordering::SeqCst) != generation
                || self.preferences()? != (location.clone(), method)
            {
                debug!("Discarding superseded prayer times for {}", location);
                return Ok(None);
            }
            self.with_db(|conn| {
                CacheRepo::store_timings(conn, &fetched)?;
                CacheRepo::prune_before(conn, today)?;
                Ok(())
            })?;
            *current = Some(fetched.clone());
        }

        info!("Prayer times refreshed for {}", location);
        self.after_timings_changed().await?;
        Ok(Some(fetched))
    }

    /// Install timings that did not come from a fetch. Any fetch still in
    /// flight loses to them.
    async fn install_timings(self: &Arc<Self>, timings: DailyTimings) -> Result<()> {
        {
            let mut current = self.timings.write().await;
            self.fetch_generation.fetch_add(1, Ordering::SeqCst);
            *current = Some(timings);
        }
        self.after_timings_changed().await
    }

    async fn after_timings_changed(self: &Arc<Self>) -> Result<()> {
        self.reschedule_notifications().await?;
        if self.is_running() {
            self.publish_status().await;
        }
        Ok(())
    }

    pub async fn current_timings(&self) -> Option<DailyTimings> {
        self.timings.read().await.clone()
    }

    pub async fn next_prayer(&self) -> Option<NextPrayer> {
        let guard = self.timings.read().await;
        next_prayer(&guard.as_ref()?.times, self.clock.now())
    }

    /// One-line status such as "Asr in 2h 45m".
    pub async fn status_text(&self) -> Option<String> {
        self.next_prayer().await.map(|next| {
            format!(
                "{} in {}",
                next.prayer,
                format_duration_secs(next.remaining.num_seconds())
            )
        })
    }

    async fn publish_status(&self) {
        if let Some(text) = self.status_text().await {
            self.notifier.status(&text);
        }
    }

    // ─── Reminders ──────────────────────────────────────────────────────────

    pub fn show_dhikr(&self) -> Result<(Dua, String)> {
        let language = self.with_db(PreferenceRepo::display_language)?;
        let duas = builtin_duas()?;
        let dua = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            random_dua(duas, &mut *rng)
                .cloned()
                .context("No reminder phrases available")?
        };
        let text = dua.text(language).to_string();
        self.notifier.info(&text);
        Ok((dua, text))
    }

    // ─── Settings ───────────────────────────────────────────────────────────

    pub async fn set_location(self: &Arc<Self>, location: Location) -> Result<Option<DailyTimings>> {
        location.require_complete()?;
        self.with_db(|conn| PreferenceRepo::set_location(conn, &location))?;
        info!("Location set to {}", location);
        self.reconfigure().await
    }

    pub async fn set_method(self: &Arc<Self>, method: CalculationMethod) -> Result<Option<DailyTimings>> {
        self.with_db(|conn| PreferenceRepo::set_calc_method(conn, method))?;
        info!("Calculation method set to {}", method);
        self.reconfigure().await
    }

    /// Location or method changed: the old timings and daily timer are void.
    async fn reconfigure(self: &Arc<Self>) -> Result<Option<DailyTimings>> {
        {
            let mut current = self.timings.write().await;
            self.fetch_generation.fetch_add(1, Ordering::SeqCst);
            *current = None;
        }
        self.reschedule_notifications().await?;
        if self.is_running() {
            self.arm_midnight().await;
        }
        self.load_or_refresh().await
    }

    pub async fn set_interval(self: &Arc<Self>, interval: ReminderInterval) -> Result<()> {
        self.with_db(|conn| PreferenceRepo::set_reminder_interval(conn, interval))?;
        if self.is_running() {
            self.arm_reminder(interval).await;
        }
        Ok(())
    }

    pub async fn set_notification_lead(self: &Arc<Self>, minutes: u32) -> Result<()> {
        self.with_db(|conn| PreferenceRepo::set_notification_lead(conn, minutes))?;
        self.reschedule_notifications().await?;
        Ok(())
    }

    pub fn set_language(&self, language: DisplayLanguage) -> Result<()> {
        self.with_db(|conn| PreferenceRepo::set_display_language(conn, language))
    }

    pub fn settings(&self) -> Result<Settings> {
        self.with_db(|conn| {
            Ok(Settings {
                location: PreferenceRepo::location(conn)?,
                method: PreferenceRepo::calc_method(conn)?,
                interval: PreferenceRepo::reminder_interval(conn)?,
                notification_lead: PreferenceRepo::notification_lead(conn)?,
                language: PreferenceRepo::display_language(conn)?,
            })
        })
    }

    // ─── Dispatch ───────────────────────────────────────────────────────────

    /// Single entry point for host commands. Failures are reported through
    /// the notifier and come back as [`Event::Failed`].
    pub async fn dispatch(self: &Arc<Self>, command: Command) -> Event {
        let name = command.name();
        debug!("dispatch {}", name);

        let outcome: Result<Event> = match command {
            Command::ShowDhikr => self
                .show_dhikr()
                .map(|(dua, text)| Event::DhikrShown { dua, text }),
            Command::ShowTimes => match self.load_or_refresh().await {
                Ok(Some(timings)) => {
                    let next = self.next_prayer().await;
                    Ok(Event::Times { timings, next })
                }
                Ok(None) => Ok(Event::Superseded),
                Err(e) => Err(e),
            },
            Command::Refresh => self.refresh_prayer_times().await.map(refreshed),
            Command::SetLocation(location) => self.set_location(location).await.map(refreshed),
            Command::SetMethod(method) => self.set_method(method).await.map(refreshed),
            Command::SetInterval(interval) => self
                .set_interval(interval)
                .await
                .map(|_| Event::SettingSaved("reminder interval")),
            Command::SetNotificationLead(minutes) => self
                .set_notification_lead(minutes)
                .await
                .map(|_| Event::SettingSaved("notification lead")),
            Command::SetLanguage(language) => self
                .set_language(language)
                .map(|_| Event::SettingSaved("display language")),
        };

        outcome.unwrap_or_else(|e| {
            self.report(&format!("{} failed", name), &e);
            Event::Failed(format!("{:#}", e))
        })
    }
}

fn nth_arg<'a>(args: &[&'a str], i: usize, setting: &'static str) -> Result<&'a str, AdhkarError> {
    args.get(i)
        .copied()
        .ok_or_else(|| AdhkarError::invalid(setting, "<missing>"))
}

fn refreshed(timings: Option<DailyTimings>) -> Event {
    match timings {
        Some(timings) => Event::Refreshed(timings),
        None => Event::Superseded,
    }
}

fn is_incomplete_location(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<AdhkarError>(),
        Some(AdhkarError::IncompleteLocation)
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub location: Location,
    pub method: CalculationMethod,
    pub interval: ReminderInterval,
    pub notification_lead: u32,
    pub language: DisplayLanguage,
}
