// Copyright 2017-2021 Lukas Pustina <lukas@pustina.de>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use hickory_proto::op::{Message, MessageType, OpCode, Query as Question};
use thiserror::Error;
use tokio::net::UdpSocket;

use crate::query::Query;

pub type ExchangeResult<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("transport error: {source}")]
    TransportError {
        #[from]
        source: std::io::Error,
    },
    #[error("protocol error: {source}")]
    ProtocolError {
        #[from]
        source: hickory_proto::ProtoError,
    },
}

/// Size of the receive buffer for one response datagram.
const MAX_RESPONSE_SIZE: usize = 4096;

/// Builds the request message for one query. Recursion is desired unless
/// the caller asks for iterative resolution.
pub fn build_message(query: &Query, recursion_desired: bool) -> Message {
    let mut message = Message::new();
    message.set_id(rand::random());
    message.set_message_type(MessageType::Query);
    message.set_op_code(OpCode::Query);
    message.set_recursion_desired(recursion_desired);
    message.add_query(Question::query(query.name().clone(), query.record_type()));

    message
}

/// Replaces the 16 bit transaction id with a fresh random one. Some
/// resolvers drop messages which look like duplicates of an in-flight
/// query. Nothing tracks ids in flight, so collisions remain possible.
pub fn randomize_id(message: &mut Message) {
    message.set_id(rand::random());
}

/// Performs one request/response round trip over a fresh UDP socket.
///
/// Any well-formed response counts as success; the answer content is not
/// checked against the request. The socket is dropped after the attempt,
/// success or failure, so every call pays one socket setup plus one round
/// trip. No timeout is imposed at this layer.
pub async fn exchange(target: SocketAddr, message: &Message) -> ExchangeResult<()> {
    let local: SocketAddr = if target.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };

    let socket = UdpSocket::bind(local).await?;
    socket.connect(target).await?;
    socket.send(&message.to_vec()?).await?;

    let mut buffer = [0u8; MAX_RESPONSE_SIZE];
    let received = socket.recv(&mut buffer).await?;
    Message::from_vec(&buffer[..received])?;

    Ok(())
}
