use std::str::FromStr;

pub const HELP: &str = "commands: start | stop | alerts on|off | status | help | quit";

/// One line typed into the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Alerts(bool),
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<String> = line
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();
        let words: Vec<&str> = words.iter().map(String::as_str).collect();

        match words.as_slice() {
            ["start"] => Ok(Self::Start),
            ["stop"] => Ok(Self::Stop),
            ["alerts", "on"] => Ok(Self::Alerts(true)),
            ["alerts", "off"] => Ok(Self::Alerts(false)),
            ["status"] => Ok(Self::Status),
            ["help"] | ["?"] => Ok(Self::Help),
            ["quit"] | ["exit"] => Ok(Self::Quit),
            [] => Err("empty command".to_string()),
            _ => Err(format!("unknown command '{}'", line.trim())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("start".parse::<Command>(), Ok(Command::Start));
        assert_eq!("  STOP ".parse::<Command>(), Ok(Command::Stop));
        assert_eq!("alerts on".parse::<Command>(), Ok(Command::Alerts(true)));
        assert_eq!("alerts  Off".parse::<Command>(), Ok(Command::Alerts(false)));
        assert_eq!("status".parse::<Command>(), Ok(Command::Status));
        assert_eq!("exit".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn test_reject_unknown() {
        assert!("alerts maybe".parse::<Command>().is_err());
        assert!("launch".parse::<Command>().is_err());
        assert!("".parse::<Command>().is_err());
    }
}
