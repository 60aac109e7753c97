//! Integration tests for the command channel → ControlLoop → Supervisor path.

use core::cell::Cell;

use crate::mock_hw::{MockHardware, MockNvs, RecordingSink};

use compressor::app::commands::{AppCommand, CommandChannel, CommandReply, ReplyChannel};
use compressor::app::events::AppEvent;
use compressor::app::ports::ClockPort;
use compressor::app::service::Supervisor;
use compressor::config::{ConfigUpdate, LoopConfig};
use compressor::error::{BlockReason, ConfigViolation, Error};
use compressor::fsm::context::Mode;
use compressor::persistence::PersistedSnapshot;
use compressor::scheduler::ControlLoop;
use embassy_sync::channel::Channel;

struct ManualClock(Cell<u64>);

impl ClockPort for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}

struct Rig {
    sup: Supervisor,
    hw: MockHardware,
    nvs: MockNvs,
    sink: RecordingSink,
    clock: ManualClock,
}

impl Rig {
    fn new() -> Self {
        let mut sup = Supervisor::new(PersistedSnapshot::default(), &LoopConfig::default(), 0);
        let mut hw = MockHardware::new();
        let mut sink = RecordingSink::new();
        sup.start(&mut hw, &mut sink);
        Self {
            sup,
            hw,
            nvs: MockNvs::new(),
            sink,
            clock: ManualClock(Cell::new(0)),
        }
    }

    fn poll_at(&mut self, lp: &mut ControlLoop<'_>, t: u64) -> bool {
        self.clock.0.set(t);
        lp.poll(
            &mut self.sup,
            &self.clock,
            &mut self.hw,
            &mut self.nvs,
            &mut self.sink,
        )
    }
}

#[test]
fn command_replies_arrive_in_order() {
    let commands: CommandChannel = Channel::new();
    let replies: ReplyChannel = Channel::new();
    let mut lp = ControlLoop::new(LoopConfig::default(), &commands, &replies);
    let mut rig = Rig::new();
    rig.poll_at(&mut lp, 0);

    commands.try_send(AppCommand::TurnOn).unwrap();
    commands
        .try_send(AppCommand::UpdateConfig(ConfigUpdate::default()))
        .unwrap();
    commands.try_send(AppCommand::GetStatus).unwrap();
    rig.poll_at(&mut lp, 100);

    assert!(matches!(replies.try_receive(), Ok(CommandReply::Done)));
    assert!(matches!(
        replies.try_receive(),
        Ok(CommandReply::Rejected(Error::InvalidConfig(
            ConfigViolation::NoFields
        )))
    ));
    match replies.try_receive() {
        Ok(CommandReply::Status(view)) => {
            assert!(view.compressor_on);
            assert_eq!(view.mode, Mode::Manual);
        }
        other => panic!("expected status, got {other:?}"),
    }
    assert!(replies.try_receive().is_err());
    assert!(rig.hw.relay_on());
}

#[test]
fn blocked_start_is_reported_as_rejection() {
    let commands: CommandChannel = Channel::new();
    let replies: ReplyChannel = Channel::new();
    let mut lp = ControlLoop::new(LoopConfig::default(), &commands, &replies);
    let mut rig = Rig::new();
    rig.hw.tank_full = true;
    rig.poll_at(&mut lp, 0);

    commands.try_send(AppCommand::TurnOn).unwrap();
    rig.poll_at(&mut lp, 50);

    assert!(matches!(
        replies.try_receive(),
        Ok(CommandReply::Rejected(Error::Blocked(BlockReason::TankFull)))
    ));
    assert!(!rig.hw.relay_on());
}

#[test]
fn replies_beyond_capacity_are_dropped_not_blocking() {
    let commands: CommandChannel = Channel::new();
    let replies: ReplyChannel = Channel::new();
    let mut lp = ControlLoop::new(LoopConfig::default(), &commands, &replies);
    let mut rig = Rig::new();
    rig.poll_at(&mut lp, 0);

    for _ in 0..4 {
        commands.try_send(AppCommand::GetStatus).unwrap();
    }
    rig.poll_at(&mut lp, 10);
    for _ in 0..4 {
        commands.try_send(AppCommand::GetStatus).unwrap();
    }
    rig.poll_at(&mut lp, 20);

    let mut received = 0;
    while replies.try_receive().is_ok() {
        received += 1;
    }
    assert_eq!(received, 4);
    assert!(commands.try_receive().is_err(), "all commands were consumed");
}

#[test]
fn automatic_duty_cycle_runs_through_the_loop() {
    let commands: CommandChannel = Channel::new();
    let replies: ReplyChannel = Channel::new();
    let mut lp = ControlLoop::new(LoopConfig::default(), &commands, &replies);
    let mut rig = Rig::new();

    let mut t = 0;
    while t < 100_000 {
        rig.poll_at(&mut lp, t);
        t += 250;
    }
    assert!(!rig.sup.is_compressor_on());
    rig.poll_at(&mut lp, 100_000);
    assert!(rig.sup.is_compressor_on());

    let telemetry = rig
        .sink
        .count(|e| matches!(e, AppEvent::Telemetry(_)));
    assert_eq!(telemetry, 2, "at 0 s and 60 s");
}
