use std::process::ExitCode;
use std::time::{Duration, Instant};

use plaza_engine::{
    AvatarId, EngineConfig, IconId, IconKind, ManualFrameHost, MotionUpdate, MovementEngine,
    OpenIntent, Topology, Vec2, WindowObject, WindowRegistry, WindowTable,
};
use serde::Serialize;
use tracing::{error, info, warn};

use super::bootstrap::{AppError, AppWiring};
use super::scenario::{Scenario, ScenarioEvent};
use super::transport::LoopbackTransport;

type ClientEngine = MovementEngine<ManualFrameHost, LoopbackTransport>;

#[derive(Debug, Serialize)]
pub(crate) struct OpenedIcon {
    pub(crate) at_ms: u64,
    pub(crate) icon: IconId,
    pub(crate) kind: IconKind,
    pub(crate) spawn_position: Vec2,
}

#[derive(Debug, Serialize)]
pub(crate) struct RemoteSummary {
    pub(crate) avatar: AvatarId,
    pub(crate) state: MotionUpdate,
}

/// Final state of a headless run, printed as JSON on stdout.
#[derive(Debug, Serialize)]
pub(crate) struct RunSummary {
    pub(crate) avatar: AvatarId,
    pub(crate) elapsed_ms: u64,
    pub(crate) frames: u64,
    pub(crate) updates_sent: u64,
    pub(crate) final_state: MotionUpdate,
    pub(crate) last_sent: Option<MotionUpdate>,
    pub(crate) windows: Vec<WindowObject>,
    pub(crate) remotes: Vec<RemoteSummary>,
    pub(crate) opened: Vec<OpenedIcon>,
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let summary = match run_scenario(app.config, &app.scenario) {
        Ok(summary) => summary,
        Err(err) => {
            error!(error = %err, "scenario_failed");
            return ExitCode::FAILURE;
        }
    };
    match serde_json::to_string_pretty(&summary).map_err(AppError::Summary) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "summary_failed");
            ExitCode::FAILURE
        }
    }
}

/// Replays `scenario` on a virtual clock. Each tick dispatches the timeline
/// events that are due, then the due timers, then the pending frame.
pub(crate) fn run_scenario(
    config: EngineConfig,
    scenario: &Scenario,
) -> Result<RunSummary, AppError> {
    let base = Instant::now();
    let at = |ms: u64| base + Duration::from_millis(ms);

    let mut windows = WindowTable::new(scenario.bounds, config.windows);
    for window in &scenario.windows {
        windows.upsert(window.clone());
    }
    let topology = Topology::new(scenario.bounds, scenario.icons.clone());
    let mut engine: ClientEngine = MovementEngine::new(
        scenario.avatar,
        config,
        topology,
        scenario.spawn,
        ManualFrameHost::new(base),
        LoopbackTransport::default(),
    )?;
    engine.start(base);

    let end_ms = scenario.end_ms();
    let mut events = scenario.timeline.iter().peekable();
    let mut opened = Vec::new();
    let mut frames = 0u64;
    let mut tick_ms = 0u64;
    loop {
        while let Some(timed) = events.next_if(|timed| timed.at_ms <= tick_ms) {
            let now = at(timed.at_ms);
            engine.host_mut().advance_to(now);
            if let Some(intent) = dispatch(&mut engine, &mut windows, &timed.event, now) {
                opened.push(OpenedIcon {
                    at_ms: timed.at_ms,
                    icon: intent.icon,
                    kind: intent.kind,
                    spawn_position: intent.spawn_position,
                });
            }
        }

        let now = at(tick_ms);
        for (timer, _) in engine.host_mut().take_due_timers(now) {
            engine.on_timer(timer, now);
        }
        if engine.host_mut().take_frame().is_some() {
            engine.on_frame(now, &mut windows);
            frames += 1;
        }

        if tick_ms >= end_ms {
            break;
        }
        tick_ms = tick_ms.saturating_add(scenario.frame_interval_ms).min(end_ms);
    }

    let summary = RunSummary {
        avatar: engine.avatar_id(),
        elapsed_ms: tick_ms,
        frames,
        updates_sent: engine.transport().sent(),
        final_state: engine.snapshot(),
        last_sent: engine.transport().last().cloned(),
        windows: windows.windows().to_vec(),
        remotes: engine
            .remotes()
            .iter()
            .map(|(avatar, remote)| RemoteSummary {
                avatar: *avatar,
                state: remote.snapshot().clone(),
            })
            .collect(),
        opened,
    };

    engine.stop(&mut windows);
    let outstanding = engine.host().outstanding();
    if outstanding != 0 {
        warn!(outstanding, "host_handles_left_after_stop");
    }
    info!(
        frames = summary.frames,
        updates_sent = summary.updates_sent,
        encode_failures = engine.transport().encode_failures(),
        elapsed_ms = summary.elapsed_ms,
        "scenario_finished"
    );
    Ok(summary)
}

fn dispatch(
    engine: &mut ClientEngine,
    windows: &mut WindowTable,
    event: &ScenarioEvent,
    now: Instant,
) -> Option<OpenIntent> {
    match event {
        ScenarioEvent::Key { key, pressed } => engine.key_event(*key, *pressed, now, windows),
        ScenarioEvent::Action { action, pressed } => {
            engine.action_event(*action, *pressed, now, windows)
        }
        ScenarioEvent::TextFocus { focused } => {
            engine.set_text_entry_focused(*focused, now, windows);
            None
        }
        ScenarioEvent::Vehicle {
            vehicle,
            speed_multiplier,
        } => {
            engine.set_vehicle(vehicle.clone(), *speed_multiplier, now);
            None
        }
        ScenarioEvent::Teleport { position } => {
            engine.teleport(*position, now);
            None
        }
        ScenarioEvent::Remote { peer, update } => {
            engine.receive_remote(*peer, update.clone(), now);
            None
        }
        ScenarioEvent::RemoteLeft { peer } => {
            engine.remove_remote(*peer);
            None
        }
        ScenarioEvent::WindowOpened { window } => {
            windows.upsert(window.clone());
            None
        }
        ScenarioEvent::WindowClosed { window } => {
            if windows.remove(*window).is_none() {
                warn!(window = %window, "window_close_unknown");
            }
            None
        }
        ScenarioEvent::WindowMinimized { window, minimized } => {
            windows.set_minimized(*window, *minimized);
            None
        }
    }
}
