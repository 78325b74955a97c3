// Two-player duel over the wireless link.
//
// Each side runs one `DuelSession`: a 1-D lane of columns, one own
// projectile slot and one incoming slot. Projectile flight is a state
// machine advanced by an external fixed-period ticker, so the control
// loop never blocks. Both sides must tick at the same period: the
// launch notification only carries the column, the flight time is
// implied by the shared tick count.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct DuelConfig {
    /// Number of lateral columns in the playfield.
    pub lane_width: i32,
    /// Row the player occupies; incoming projectiles resolve here.
    pub player_row: i32,
    /// Row an own projectile spawns at, travelling toward row 0.
    pub fire_row: i32,
    /// Column the player starts in.
    pub start_column: i32,
    /// Fixed animation step shared by both endpoints.
    pub tick_every: Duration,
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            lane_width: 5,
            player_row: 4,
            fire_row: 3,
            start_column: 2,
            tick_every: Duration::from_millis(250),
        }
    }
}

/// Lane column plus travel row of one projectile in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projectile {
    pub column: i32,
    pub row: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatState {
    Idle,
    ProjectileInFlight,
    Hit,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Ongoing,
    Won,
    Lost,
}

/// Protocol alphabet exchanged between the two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuelEvent {
    /// A shot completed its travel on the firing side; carries the
    /// shooter's column at launch.
    Launch { column: i32 },
    /// The sender was hit and lost.
    Defeat,
}

pub struct DuelSession {
    config: DuelConfig,
    position: i32,
    own: Option<Projectile>,
    incoming: Option<Projectile>,
    outcome: GameOutcome,
}

impl DuelSession {
    pub fn new(config: DuelConfig) -> Self {
        let position = config.start_column;
        Self {
            config,
            position,
            own: None,
            incoming: None,
            outcome: GameOutcome::Ongoing,
        }
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn outcome(&self) -> GameOutcome {
        self.outcome
    }

    pub fn own_projectile(&self) -> Option<Projectile> {
        self.own
    }

    pub fn incoming_projectile(&self) -> Option<Projectile> {
        self.incoming
    }

    pub fn state(&self) -> CombatState {
        match self.outcome {
            GameOutcome::Lost => CombatState::Hit,
            GameOutcome::Won => CombatState::Resolved,
            GameOutcome::Ongoing if self.own.is_some() => CombatState::ProjectileInFlight,
            GameOutcome::Ongoing => CombatState::Idle,
        }
    }

    /// Steps one column left or right. Moving is allowed at any time,
    /// including while a shot is in flight; a move that would leave the
    /// lane is a no-op.
    pub fn move_player(&mut self, direction: i32) {
        let next = self.position + direction.signum();
        if next < 0 || next >= self.config.lane_width {
            return;
        }
        self.position = next;
    }

    /// Launches an own projectile from the current column. A fire while
    /// one is already in flight, or after the game is decided, is a
    /// silent no-op.
    pub fn fire(&mut self) {
        if self.own.is_some() || self.outcome != GameOutcome::Ongoing {
            return;
        }
        self.own = Some(Projectile {
            column: self.position,
            row: self.config.fire_row,
        });
    }

    /// Mirrors a peer launch into this side's coordinate frame and spawns
    /// the incoming projectile at the far edge. A column outside the lane
    /// is dropped.
    pub fn receive_launch(&mut self, column: i32) {
        let mirrored = self.config.lane_width - 1 - column;
        if mirrored < 0 || mirrored >= self.config.lane_width {
            return;
        }
        self.incoming = Some(Projectile {
            column: mirrored,
            row: 0,
        });
    }

    /// The peer reports it was hit by our shot.
    pub fn receive_defeat(&mut self) {
        if self.outcome == GameOutcome::Ongoing {
            self.outcome = GameOutcome::Won;
        }
    }

    /// One fixed-duration animation step for both projectile slots.
    /// Returns the events to broadcast to the peer this tick.
    pub fn tick(&mut self) -> Vec<DuelEvent> {
        let mut events = Vec::new();

        if let Some(p) = self.own.as_mut() {
            p.row -= 1;
            if p.row < 0 {
                // Travel complete: only now does the peer learn about it.
                events.push(DuelEvent::Launch { column: p.column });
                self.own = None;
            }
        }

        if let Some(p) = self.incoming.as_mut() {
            p.row += 1;
            if p.row >= self.config.player_row {
                let column = p.column;
                self.incoming = None;
                if column == self.position && self.outcome == GameOutcome::Ongoing {
                    self.outcome = GameOutcome::Lost;
                    events.push(DuelEvent::Defeat);
                }
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> DuelSession {
        DuelSession::new(DuelConfig::default())
    }

    #[test]
    fn launch_notification_only_after_full_travel() {
        let mut s = session();
        s.fire();
        assert_eq!(s.state(), CombatState::ProjectileInFlight);

        // fire_row = 3: three ticks to reach row 0, retired on the fourth.
        for _ in 0..3 {
            assert!(s.tick().is_empty());
            assert_eq!(s.state(), CombatState::ProjectileInFlight);
        }
        assert_eq!(s.tick(), vec![DuelEvent::Launch { column: 2 }]);
        assert_eq!(s.state(), CombatState::Idle);
    }

    #[test]
    fn launch_carries_the_column_at_fire_time() {
        let mut s = session();
        s.fire();
        s.move_player(1);
        s.move_player(1);
        let events: Vec<_> = (0..4).flat_map(|_| s.tick()).collect();
        assert_eq!(events, vec![DuelEvent::Launch { column: 2 }]);
        assert_eq!(s.position(), 4);
    }

    #[test]
    fn duplicate_fire_is_a_no_op() {
        let mut s = session();
        s.fire();
        s.tick();
        s.move_player(-1);
        s.fire(); // still in flight, ignored
        let events: Vec<_> = (0..8).flat_map(|_| s.tick()).collect();
        assert_eq!(events, vec![DuelEvent::Launch { column: 2 }]);
    }

    #[test]
    fn moves_clamp_to_the_lane() {
        let mut s = session();
        s.move_player(-1);
        s.move_player(-1);
        s.move_player(-1);
        assert_eq!(s.position(), 0);
        for _ in 0..6 {
            s.move_player(1);
        }
        assert_eq!(s.position(), 4);
        s.move_player(0);
        assert_eq!(s.position(), 4);
    }

    #[test]
    fn incoming_column_is_mirrored() {
        let mut s = session();
        s.receive_launch(0);
        assert_eq!(s.incoming_projectile().unwrap().column, 4);
        s.receive_launch(2);
        assert_eq!(s.incoming_projectile().unwrap().column, 2);
        assert_eq!(s.incoming_projectile().unwrap().row, 0);
    }

    #[test]
    fn out_of_lane_launch_is_dropped() {
        let mut s = session();
        s.receive_launch(-1);
        assert_eq!(s.incoming_projectile(), None);
        s.receive_launch(7);
        assert_eq!(s.incoming_projectile(), None);
    }

    #[test]
    fn incoming_on_own_column_is_a_hit() {
        let mut s = session();
        // Shooter at column 2 in a lane of 5 mirrors back onto column 2.
        s.receive_launch(2);
        for _ in 0..3 {
            assert!(s.tick().is_empty());
        }
        assert_eq!(s.tick(), vec![DuelEvent::Defeat]);
        assert_eq!(s.outcome(), GameOutcome::Lost);
        assert_eq!(s.state(), CombatState::Hit);
    }

    #[test]
    fn dodged_incoming_retires_silently() {
        let mut s = session();
        s.receive_launch(2);
        s.move_player(1);
        let events: Vec<_> = (0..4).flat_map(|_| s.tick()).collect();
        assert!(events.is_empty());
        assert_eq!(s.outcome(), GameOutcome::Ongoing);
        assert_eq!(s.incoming_projectile(), None);
    }

    #[test]
    fn movement_is_allowed_while_incoming_is_in_flight() {
        let mut s = session();
        s.receive_launch(2);
        s.tick();
        s.move_player(-1);
        assert_eq!(s.position(), 1);
    }

    #[test]
    fn peer_defeat_resolves_the_session() {
        let mut s = session();
        s.receive_defeat();
        assert_eq!(s.outcome(), GameOutcome::Won);
        assert_eq!(s.state(), CombatState::Resolved);
        // Terminal: a later fire changes nothing.
        s.fire();
        assert_eq!(s.own_projectile(), None);
    }

    #[test]
    fn both_flights_take_the_same_tick_count() {
        // Protocol timing contract: own travel (fire_row 3 -> retire) and
        // incoming travel (row 0 -> player_row 4) both take four ticks.
        let mut shooter = session();
        let mut target = session();
        shooter.fire();
        let mut launch = None;
        let mut own_ticks = 0;
        while launch.is_none() {
            own_ticks += 1;
            launch = shooter.tick().first().copied();
        }
        let DuelEvent::Launch { column } = launch.unwrap() else {
            panic!("expected a launch");
        };

        target.receive_launch(column);
        let mut incoming_ticks = 0;
        while target.incoming_projectile().is_some() {
            incoming_ticks += 1;
            target.tick();
        }
        assert_eq!(own_ticks, incoming_ticks);
        assert_eq!(target.outcome(), GameOutcome::Lost);
    }
}
