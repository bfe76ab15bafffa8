// src/core/commands/mod.rs

//! Defines all supported commands and the central `Command` enum that
//! encapsulates their parsed state, dispatching to each variant's own
//! `ParseCommand`/`ExecutableCommand` implementation.

use crate::core::commands::command_trait::{
    CommandExt, CommandFlags, ExecutableCommand, WriteOutcome,
};
use crate::core::database::ExecutionContext;
use crate::core::protocol::RespFrame;
use crate::core::{RespValue, SpinelDBError};
use async_trait::async_trait;
use bytes::Bytes;

pub mod command_trait;
pub mod generic;
pub mod helpers;
pub mod list;
pub mod streams;
pub mod string;

use self::generic::{Del, Echo, Ping, TypeInfo};
use self::list::{BLPop, LLen, LPop, LPush, LRange, RPush};
use self::streams::{XAdd, XRange, XRead};
use self::string::{Get, Incr, Set};

/// The parsed form of every command this server supports, including the
/// transaction-control verbs `MULTI`/`EXEC`/`DISCARD`, which carry no
/// arguments of their own and are special-cased by the connection router.
#[derive(Debug, Clone)]
pub enum Command {
    Ping(Ping),
    Echo(Echo),
    Del(Del),
    Type(TypeInfo),
    Get(Get),
    Set(Set),
    Incr(Incr),
    LPush(LPush),
    RPush(RPush),
    LPop(LPop),
    LRange(LRange),
    LLen(LLen),
    BLPop(BLPop),
    XAdd(XAdd),
    XRange(XRange),
    XRead(XRead),
    Multi,
    Exec,
    Discard,
}

impl TryFrom<RespFrame> for Command {
    type Error = SpinelDBError;

    /// Converts a decoded request frame — always a RESP array of bulk
    /// strings on the wire — into a parsed `Command`.
    fn try_from(frame: RespFrame) -> Result<Self, SpinelDBError> {
        let RespFrame::Array(mut elements) = frame else {
            return Err(SpinelDBError::Protocol(
                "expected a RESP array for a command request".into(),
            ));
        };
        if elements.is_empty() {
            return Err(SpinelDBError::Protocol("empty command array".into()));
        }
        let name = self::helpers::extract_string(&elements[0])?.to_ascii_uppercase();
        let args = elements.split_off(1);
        Command::parse(&name, &args)
    }
}

impl Command {
    /// Parses a command from its uppercased name and argument slice, as
    /// read off the wire by the connection loop.
    pub fn parse(name: &str, args: &[RespFrame]) -> Result<Self, SpinelDBError> {
        use crate::core::commands::command_trait::ParseCommand;

        Ok(match name {
            "PING" => Command::Ping(Ping::parse(args)?),
            "ECHO" => Command::Echo(Echo::parse(args)?),
            "DEL" => Command::Del(Del::parse(args)?),
            "TYPE" => Command::Type(TypeInfo::parse(args)?),
            "GET" => Command::Get(Get::parse(args)?),
            "SET" => Command::Set(Set::parse(args)?),
            "INCR" => Command::Incr(Incr::parse(args)?),
            "LPUSH" => Command::LPush(LPush::parse(args)?),
            "RPUSH" => Command::RPush(RPush::parse(args)?),
            "LPOP" => Command::LPop(LPop::parse(args)?),
            "LRANGE" => Command::LRange(LRange::parse(args)?),
            "LLEN" => Command::LLen(LLen::parse(args)?),
            "BLPOP" => Command::BLPop(BLPop::parse(args)?),
            "XADD" => Command::XAdd(XAdd::parse(args)?),
            "XRANGE" => Command::XRange(XRange::parse(args)?),
            "XREAD" => Command::XRead(XRead::parse(args)?),
            "MULTI" => {
                if !args.is_empty() {
                    return Err(SpinelDBError::WrongArgumentCount("MULTI".to_string()));
                }
                Command::Multi
            }
            "EXEC" => {
                if !args.is_empty() {
                    return Err(SpinelDBError::WrongArgumentCount("EXEC".to_string()));
                }
                Command::Exec
            }
            "DISCARD" => {
                if !args.is_empty() {
                    return Err(SpinelDBError::WrongArgumentCount("DISCARD".to_string()));
                }
                Command::Discard
            }
            _ => return Err(SpinelDBError::UnknownCommand(name.to_string())),
        })
    }
}

#[async_trait]
impl CommandExt for Command {
    fn get_flags(&self) -> CommandFlags {
        match self {
            Command::Ping(_) | Command::Echo(_) => CommandFlags::empty(),
            Command::Del(_) => CommandFlags::WRITE,
            Command::Type(_) => CommandFlags::READONLY,
            Command::Get(_) => CommandFlags::READONLY,
            Command::Set(_) => CommandFlags::WRITE,
            Command::Incr(_) => CommandFlags::WRITE,
            Command::LPush(_) | Command::RPush(_) | Command::LPop(_) => CommandFlags::WRITE,
            Command::LRange(_) | Command::LLen(_) => CommandFlags::READONLY,
            Command::BLPop(_) => CommandFlags::WRITE,
            Command::XAdd(_) => CommandFlags::WRITE,
            Command::XRange(_) | Command::XRead(_) => CommandFlags::READONLY,
            Command::Multi | Command::Exec | Command::Discard => CommandFlags::TRANSACTION,
        }
    }

    fn get_keys(&self) -> Vec<Bytes> {
        match self {
            Command::Ping(_) | Command::Echo(_) | Command::Multi | Command::Exec | Command::Discard => {
                vec![]
            }
            Command::Del(cmd) => cmd.keys.clone(),
            Command::Type(cmd) => vec![cmd.key.clone()],
            Command::Get(cmd) => vec![cmd.key.clone()],
            Command::Set(cmd) => vec![cmd.key.clone()],
            Command::Incr(cmd) => vec![cmd.key.clone()],
            Command::LPush(cmd) => vec![cmd.key.clone()],
            Command::RPush(cmd) => vec![cmd.key.clone()],
            Command::LPop(cmd) => vec![cmd.key.clone()],
            Command::LRange(cmd) => vec![cmd.key.clone()],
            Command::LLen(cmd) => vec![cmd.key.clone()],
            Command::BLPop(cmd) => cmd.keys.clone(),
            Command::XAdd(cmd) => vec![cmd.key.clone()],
            Command::XRange(cmd) => vec![cmd.key.clone()],
            Command::XRead(cmd) => cmd.streams.iter().map(|(k, _)| k.clone()).collect(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Command::Ping(_) => "PING",
            Command::Echo(_) => "ECHO",
            Command::Del(_) => "DEL",
            Command::Type(_) => "TYPE",
            Command::Get(_) => "GET",
            Command::Set(_) => "SET",
            Command::Incr(_) => "INCR",
            Command::LPush(_) => "LPUSH",
            Command::RPush(_) => "RPUSH",
            Command::LPop(_) => "LPOP",
            Command::LRange(_) => "LRANGE",
            Command::LLen(_) => "LLEN",
            Command::BLPop(_) => "BLPOP",
            Command::XAdd(_) => "XADD",
            Command::XRange(_) => "XRANGE",
            Command::XRead(_) => "XREAD",
            Command::Multi => "MULTI",
            Command::Exec => "EXEC",
            Command::Discard => "DISCARD",
        }
    }

    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), SpinelDBError> {
        match self {
            Command::Ping(cmd) => cmd.execute(ctx).await,
            Command::Echo(cmd) => cmd.execute(ctx).await,
            Command::Del(cmd) => cmd.execute(ctx).await,
            Command::Type(cmd) => cmd.execute(ctx).await,
            Command::Get(cmd) => cmd.execute(ctx).await,
            Command::Set(cmd) => cmd.execute(ctx).await,
            Command::Incr(cmd) => cmd.execute(ctx).await,
            Command::LPush(cmd) => cmd.execute(ctx).await,
            Command::RPush(cmd) => cmd.execute(ctx).await,
            Command::LPop(cmd) => cmd.execute(ctx).await,
            Command::LRange(cmd) => cmd.execute(ctx).await,
            Command::LLen(cmd) => cmd.execute(ctx).await,
            Command::BLPop(cmd) => cmd.execute(ctx).await,
            Command::XAdd(cmd) => cmd.execute(ctx).await,
            Command::XRange(cmd) => cmd.execute(ctx).await,
            Command::XRead(cmd) => cmd.execute(ctx).await,
            Command::Multi | Command::Exec | Command::Discard => Err(SpinelDBError::Internal(
                "transaction control commands are handled by the router".into(),
            )),
        }
    }
}
