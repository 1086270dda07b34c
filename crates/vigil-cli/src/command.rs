//! Operator commands read from stdin.

use anyhow::{Context, Result, bail};
use vigil_core::FeatureFlag;
use vigil_hardware::ADC_MAX;

pub const HELP: &str = "\
commands:
  keys <keys>               type on the keypad, e.g. `keys 123456#`
  card <uid>                present a card, e.g. `card 7A 77 C7 B2`
  door open|closed          magnetic contact
  motion on|off             PIR output
  vibration <0-4095>        piezo amplitude
  remote <feature> on|off   toggle a feature in the remote store
  wifi up|down              network link
  status                    LCD, flags, buzzer and sync counters
  help
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Keys(String),
    Card(Vec<u8>),
    Door { open: bool },
    Motion(bool),
    Vibration(u16),
    Remote { feature: FeatureFlag, enabled: bool },
    Wifi { up: bool },
    Status,
    Help,
    Quit,
}

impl std::str::FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            bail!("empty command");
        };
        let rest: Vec<&str> = words.collect();

        let command = match (verb.to_ascii_lowercase().as_str(), rest.as_slice()) {
            ("keys", [keys]) => Command::Keys((*keys).to_string()),
            ("card", parts) if !parts.is_empty() => Command::Card(parse_uid(&parts.concat())?),
            ("door", [state]) => Command::Door {
                open: switch(state, "open", "closed")?,
            },
            ("motion", [state]) => Command::Motion(switch(state, "on", "off")?),
            ("vibration", [value]) => {
                let amplitude: u16 = value
                    .parse()
                    .with_context(|| format!("not an amplitude: '{value}'"))?;
                if amplitude > ADC_MAX {
                    bail!("amplitude {amplitude} above {ADC_MAX}");
                }
                Command::Vibration(amplitude)
            }
            ("remote", [feature, state]) => Command::Remote {
                feature: feature.parse()?,
                enabled: switch(state, "on", "off")?,
            },
            ("wifi", [state]) => Command::Wifi {
                up: switch(state, "up", "down")?,
            },
            ("status", []) => Command::Status,
            ("help" | "?", []) => Command::Help,
            ("quit" | "exit", []) => Command::Quit,
            _ => bail!("unrecognized command: '{}' (try `help`)", line.trim()),
        };
        Ok(command)
    }
}

fn switch(word: &str, on: &str, off: &str) -> Result<bool> {
    match word.to_ascii_lowercase() {
        w if w == on => Ok(true),
        w if w == off => Ok(false),
        _ => bail!("expected '{on}' or '{off}', got '{word}'"),
    }
}

/// Raw bytes from a hex string. Any length is accepted so that the reader's
/// handling of short or oversized UIDs can be exercised.
fn parse_uid(hex: &str) -> Result<Vec<u8>> {
    let hex: String = hex.chars().filter(|c| !matches!(c, ':' | '-')).collect();
    if !hex.is_ascii() || hex.len() % 2 != 0 {
        bail!("card UID must be whole hex bytes, got '{hex}'");
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .with_context(|| format!("not hexadecimal: '{}'", &hex[i..i + 2]))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("keys 123456#", Command::Keys("123456#".into()))]
    #[case("card 7A 77 C7 B2", Command::Card(vec![0x7A, 0x77, 0xC7, 0xB2]))]
    #[case("card 43:10:73:0e", Command::Card(vec![0x43, 0x10, 0x73, 0x0E]))]
    #[case("card 01", Command::Card(vec![0x01]))]
    #[case("door open", Command::Door { open: true })]
    #[case("DOOR Closed", Command::Door { open: false })]
    #[case("motion on", Command::Motion(true))]
    #[case("vibration 4095", Command::Vibration(4_095))]
    #[case("remote keypad off", Command::Remote { feature: FeatureFlag::Keypad, enabled: false })]
    #[case("remote siren on", Command::Remote { feature: FeatureFlag::Alarm, enabled: true })]
    #[case("wifi down", Command::Wifi { up: false })]
    #[case("  status  ", Command::Status)]
    #[case("?", Command::Help)]
    #[case("exit", Command::Quit)]
    fn test_parse(#[case] line: &str, #[case] expected: Command) {
        assert_eq!(line.parse::<Command>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("keys")]
    #[case("card 7A7")]
    #[case("card zz")]
    #[case("door ajar")]
    #[case("vibration 5000")]
    #[case("vibration -1")]
    #[case("remote toaster on")]
    #[case("status now")]
    #[case("dance")]
    fn test_parse_rejects(#[case] line: &str) {
        assert!(line.parse::<Command>().is_err());
    }
}
