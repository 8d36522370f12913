use std::num::IntErrorKind;
use std::str::FromStr;

use thiserror::Error;

/// Keyword that closes the current batch.
pub const TERMINATE_KEYWORD: &str = "end";

/// An operation decoded from a request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Adds the value to the current batch and waits for its result.
    Contribute(i64),
    /// Closes the current batch, echoing `token` to every participant.
    Terminate { token: String },
}

/// Errors raised for bodies that are neither an integer nor a terminate command.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("empty body, expected an integer or `end [token]`")]
    Empty,

    #[error("`{0}` is neither an integer nor `end [token]`")]
    Malformed(String),

    #[error("`{0}` does not fit in a signed 64-bit integer")]
    OutOfRange(String),
}

impl FromStr for Command {
    type Err = ParseCommandError;

    /// Parses `end`, `end <token>` or a signed decimal integer.
    ///
    /// The token is everything after the single whitespace character following the
    /// keyword, spaces included. One trailing line terminator is ignored.
    fn from_str(body: &str) -> Result<Self, Self::Err> {
        let body = body
            .strip_suffix("\r\n")
            .or_else(|| body.strip_suffix('\n'))
            .unwrap_or(body);

        if body.is_empty() {
            return Err(ParseCommandError::Empty);
        }

        if let Some(rest) = body.strip_prefix(TERMINATE_KEYWORD) {
            let mut chars = rest.chars();
            match chars.next() {
                None => {
                    return Ok(Command::Terminate {
                        token: String::new(),
                    });
                }
                Some(separator) if separator.is_whitespace() => {
                    return Ok(Command::Terminate {
                        token: chars.as_str().to_owned(),
                    });
                }
                // `endex` and friends are not the keyword.
                Some(_) => {}
            }
        }

        body.parse::<i64>()
            .map(Command::Contribute)
            .map_err(|err| match err.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                    ParseCommandError::OutOfRange(body.to_owned())
                }
                _ => ParseCommandError::Malformed(body.to_owned()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terminate(token: &str) -> Command {
        Command::Terminate {
            token: token.to_string(),
        }
    }

    #[test]
    fn parses_signed_integers() {
        assert_eq!("7".parse::<Command>(), Ok(Command::Contribute(7)));
        assert_eq!("-8".parse::<Command>(), Ok(Command::Contribute(-8)));
        assert_eq!("+5".parse::<Command>(), Ok(Command::Contribute(5)));
        assert_eq!("42\n".parse::<Command>(), Ok(Command::Contribute(42)));
        assert_eq!(
            i64::MIN.to_string().parse::<Command>(),
            Ok(Command::Contribute(i64::MIN))
        );
    }

    #[test]
    fn parses_terminate_with_and_without_token() {
        assert_eq!("end".parse::<Command>(), Ok(terminate("")));
        assert_eq!("end t1".parse::<Command>(), Ok(terminate("t1")));
        assert_eq!("end a b".parse::<Command>(), Ok(terminate("a b")));
        assert_eq!("end  x".parse::<Command>(), Ok(terminate(" x")));
        assert_eq!("end t1\r\n".parse::<Command>(), Ok(terminate("t1")));
    }

    #[test]
    fn rejects_near_misses_of_the_keyword() {
        for body in [" end x", "send x", "endex x", "END x", "8s", " 7", "7 "] {
            assert_eq!(
                body.parse::<Command>(),
                Err(ParseCommandError::Malformed(body.to_string())),
                "{body:?} should be malformed"
            );
        }
    }

    #[test]
    fn rejects_empty_and_out_of_range_bodies() {
        assert_eq!("".parse::<Command>(), Err(ParseCommandError::Empty));
        assert_eq!("\n".parse::<Command>(), Err(ParseCommandError::Empty));
        assert_eq!(
            "9223372036854775808".parse::<Command>(),
            Err(ParseCommandError::OutOfRange(
                "9223372036854775808".to_string()
            ))
        );
    }
}
