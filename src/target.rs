// Copyright 2017-2021 Lukas Pustina <lukas@pustina.de>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use crate::{Error, Result};

const DEFAULT_DNS_PORT: u16 = 53;

/// The resolver under test, parsed once at startup and shared read-only by
/// all workers for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverTarget {
    ip: IpAddr,
    port: u16,
}

impl ResolverTarget {
    pub fn new<T: Into<IpAddr>>(ip: T, port: u16) -> ResolverTarget {
        ResolverTarget { ip: ip.into(), port }
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl From<SocketAddr> for ResolverTarget {
    fn from(addr: SocketAddr) -> Self {
        ResolverTarget {
            ip: addr.ip(),
            port: addr.port(),
        }
    }
}

impl fmt::Display for ResolverTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip {
            IpAddr::V4(ip) => write!(f, "{}:{}", ip, self.port),
            IpAddr::V6(ip) => write!(f, "[{}]:{}", ip, self.port),
        }
    }
}

impl FromStr for ResolverTarget {
    type Err = Error;

    fn from_str(str: &str) -> Result<ResolverTarget> {
        match parser::parsed_resolver_target(str) {
            Ok(("", (ip, port))) => Ok(ResolverTarget {
                ip,
                port: port.unwrap_or(DEFAULT_DNS_PORT),
            }),
            Ok((rest, _)) => Err(Error::ParserError {
                what: str.to_string(),
                to: "ResolverTarget",
                why: format!("trailing input '{}'", rest),
            }),
            Err(nom::Err::Incomplete(_)) => Err(Error::ParserError {
                what: str.to_string(),
                to: "ResolverTarget",
                why: "input is incomplete".to_string(),
            }),
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(Error::ParserError {
                what: str.to_string(),
                to: "ResolverTarget",
                why: format!("invalid address near '{}'", e.input),
            }),
        }
    }
}

pub(crate) mod parser {
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
    use std::str::FromStr;

    use nom::branch::alt;
    use nom::bytes::complete::{tag, take_while1};
    use nom::character::complete::digit1;
    use nom::combinator::{map, map_res, opt};
    use nom::sequence::delimited;
    use nom::{AsChar, IResult};

    /// Accepts `IP ADDR[:PORT]` with IPv6 addresses in brackets when a port
    /// follows, plus `localhost` as a shorthand for 127.0.0.1.
    pub(crate) fn parsed_resolver_target(input: &str) -> IResult<&str, (IpAddr, Option<u16>)> {
        let (input, ip) = alt((ipv4, bracketed_ipv6, localhost, ipv6))(input)?;
        let (input, port) = opt(port)(input)?;

        Ok((input, (ip, port)))
    }

    fn ipv4(input: &str) -> IResult<&str, IpAddr> {
        map(
            map_res(
                take_while1(|c: char| c.is_ascii_digit() || c == '.'),
                Ipv4Addr::from_str,
            ),
            IpAddr::V4,
        )(input)
    }

    fn bracketed_ipv6(input: &str) -> IResult<&str, IpAddr> {
        map(delimited(tag("["), ipv6_addr, tag("]")), IpAddr::V6)(input)
    }

    fn ipv6(input: &str) -> IResult<&str, IpAddr> {
        map(ipv6_addr, IpAddr::V6)(input)
    }

    fn ipv6_addr(input: &str) -> IResult<&str, Ipv6Addr> {
        map_res(
            take_while1(|c: char| c.is_hex_digit() || c == ':' || c == '.'),
            Ipv6Addr::from_str,
        )(input)
    }

    fn localhost(input: &str) -> IResult<&str, IpAddr> {
        map(tag("localhost"), |_| IpAddr::V4(Ipv4Addr::LOCALHOST))(input)
    }

    fn port(input: &str) -> IResult<&str, u16> {
        let (input, _) = tag(":")(input)?;
        map_res(digit1, str::parse)(input)
    }
}
