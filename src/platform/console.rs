//! Headless console driver
//!
//! Reads one command per line and drives a [`Session`]. Emitted events and
//! state dumps are written as JSON lines.
//!
//! ```text
//! tap 1.0 -0.5     set a world-space target
//! move left        step request in a direction
//! tick 10          advance ticks (default 1)
//! walk -1 1        set a target and tick until the player stops
//! state            print the snapshot
//! reset            erase the save and start over
//! quit
//! ```

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use glam::Vec2;
use thiserror::Error;

use crate::persistence::SaveStore;
use crate::session::Session;
use crate::sim::Facing;

/// Upper bound on ticks spent by one `walk`
pub const WALK_TICK_LIMIT: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Tap(Vec2),
    Move(Facing),
    Tick(u32),
    Walk(Vec2),
    State,
    Reset,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("not a number: '{0}'")]
    BadNumber(String),
    #[error("unknown direction '{0}'")]
    BadDirection(String),
}

fn number<T: FromStr>(arg: Option<&str>, name: &'static str) -> Result<T, CommandError> {
    let arg = arg.ok_or(CommandError::MissingArgument(name))?;
    arg.parse()
        .map_err(|_| CommandError::BadNumber(arg.to_string()))
}

fn point<'a>(args: &mut impl Iterator<Item = &'a str>) -> Result<Vec2, CommandError> {
    let x: f32 = number(args.next(), "x")?;
    let y: f32 = number(args.next(), "y")?;
    if !x.is_finite() || !y.is_finite() {
        return Err(CommandError::BadNumber(format!("{} {}", x, y)));
    }
    Ok(Vec2::new(x, y))
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(CommandError::Empty)?;

        match name.to_lowercase().as_str() {
            "tap" | "t" => point(&mut words).map(Command::Tap),
            "walk" | "w" => point(&mut words).map(Command::Walk),
            "move" | "m" => {
                let dir = words.next().ok_or(CommandError::MissingArgument("direction"))?;
                dir.parse::<Facing>()
                    .map(Command::Move)
                    .map_err(|e| CommandError::BadDirection(e.0))
            }
            "tick" => match words.next() {
                None => Ok(Command::Tick(1)),
                count => number(count, "count").map(Command::Tick),
            },
            "state" | "s" => Ok(Command::State),
            "reset" => Ok(Command::Reset),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn print_events<S: SaveStore, W: Write>(session: &mut Session<S>, out: &mut W) -> io::Result<()> {
    for event in session.drain_events() {
        match serde_json::to_string(&event) {
            Ok(json) => writeln!(out, "{}", json)?,
            Err(e) => log::warn!("Could not encode event: {}", e),
        }
    }
    Ok(())
}

fn tick_n<S: SaveStore>(session: &mut Session<S>, n: u32) -> u32 {
    let mut ran = 0;
    while ran < n {
        session.tick();
        ran += 1;
    }
    ran
}

fn walk<S: SaveStore>(session: &mut Session<S>, target: Vec2) -> u32 {
    session.set_target(target);
    let mut ran = 0;
    while session.state().player.target.is_some() && ran < WALK_TICK_LIMIT {
        session.tick();
        ran += 1;
    }
    if session.state().player.target.is_some() {
        log::warn!("Walk gave up after {} ticks", ran);
    }
    ran
}

/// Run one command; returns false when the driver should stop
pub fn execute<S: SaveStore, W: Write>(
    session: &mut Session<S>,
    command: Command,
    out: &mut W,
) -> io::Result<bool> {
    match command {
        Command::Tap(target) => session.set_target(target),
        Command::Move(facing) => session.request_move(facing),
        Command::Tick(n) => {
            tick_n(session, n);
        }
        Command::Walk(target) => {
            let ticks = walk(session, target);
            log::debug!("Walk took {} ticks", ticks);
        }
        Command::State => {
            let pos = session.state().player.position;
            writeln!(
                out,
                "scene {} at ({:.3}, {:.3}) facing {:?}",
                session.state().scene_index,
                pos.x,
                pos.y,
                session.state().player.facing
            )?;
            match serde_json::to_string(&session.snapshot()) {
                Ok(json) => writeln!(out, "{}", json)?,
                Err(e) => log::warn!("Could not encode snapshot: {}", e),
            }
        }
        Command::Reset => session.reset(),
        Command::Help => writeln!(out, "commands: tap x y | move dir | tick [n] | walk x y | state | reset | quit")?,
        Command::Quit => return Ok(false),
    }
    print_events(session, out)?;
    Ok(true)
}

/// Drive `session` from `input` until EOF or `quit`
pub fn run<S: SaveStore, R: BufRead, W: Write>(
    session: &mut Session<S>,
    input: R,
    out: &mut W,
) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        match line.parse::<Command>() {
            Ok(command) => {
                if !execute(session, command, out)? {
                    break;
                }
            }
            Err(e) => writeln!(out, "error: {}", e)?,
        }
        out.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{self, MemoryStore};
    use crate::sim::SceneRegistry;
    use crate::tuning::Tuning;
    use std::sync::Arc;

    fn session() -> Session<MemoryStore> {
        let registry = Arc::new(SceneRegistry::builtin().unwrap());
        let mut session = Session::new(registry, Tuning::default(), MemoryStore::new());
        session.initialize();
        session
    }

    fn drive(session: &mut Session<MemoryStore>, script: &str) -> String {
        let mut out = Vec::new();
        run(session, script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("tap 1 -0.5".parse(), Ok(Command::Tap(Vec2::new(1.0, -0.5))));
        assert_eq!("move LEFT".parse(), Ok(Command::Move(Facing::Left)));
        assert_eq!("tick".parse(), Ok(Command::Tick(1)));
        assert_eq!("tick 12".parse(), Ok(Command::Tick(12)));
        assert_eq!("  q ".parse(), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!("tap 1".parse::<Command>(), Err(CommandError::MissingArgument("y")));
        assert_eq!(
            "tap one 2".parse::<Command>(),
            Err(CommandError::BadNumber("one".into()))
        );
        assert_eq!(
            "move sideways".parse::<Command>(),
            Err(CommandError::BadDirection("sideways".into()))
        );
        assert!(matches!("jump".parse::<Command>(), Err(CommandError::Unknown(_))));
    }

    #[test]
    fn test_walk_collects_and_prints_event() {
        let mut session = session();
        let out = drive(&mut session, "walk -1 1\n");

        assert!(out.contains(r#""event":"pickupCollected""#));
        assert!(out.contains(r#""id":"coin_1""#));
        assert!(persistence::has_save(session.store()).unwrap());
    }

    #[test]
    fn test_walk_from_idle_reaches_target() {
        let mut session = session();
        assert!(!session.state().player.is_moving());

        drive(&mut session, "walk -1 -0.3\n");
        let pos = session.state().player.position;
        assert!(pos.distance(Vec2::new(-1.0, -0.3)) < 0.01, "stopped at {:?}", pos);
        assert!(session.state().player.target.is_none());
    }

    #[test]
    fn test_quit_stops_reading() {
        let mut session = session();
        let out = drive(&mut session, "quit\nwalk -1 1\n");
        assert!(out.is_empty());
        assert!(!session.state().is_collected("coin_1"));
    }

    #[test]
    fn test_bad_line_reports_and_continues() {
        let mut session = session();
        let out = drive(&mut session, "# comment\nfly\nstate\n");
        assert!(out.starts_with("error: unknown command 'fly'"));
        assert!(out.contains(r#""currentScene":0"#));
    }
}
