/*
 * Licensed to the Apache Software Foundation (ASF) under one
 * or more contributor license agreements.  See the NOTICE file
 * distributed with this work for additional information
 * regarding copyright ownership.  The ASF licenses this file
 * to you under the Apache License, Version 2.0 (the
 * "License"); you may not use this file except in compliance
 * with the License.  You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing,
 * software distributed under the License is distributed on an
 * "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
 * KIND, either express or implied.  See the License for the
 * specific language governing permissions and limitations
 * under the License.
 */

//! Loopback port selection for instances started without an explicit address.
//!
//! The registry does not set SO_REUSEPORT, so the reservation has to be
//! released before the child binds. The window between release and bind is
//! the caller's problem, same as for a caller-supplied address.

use crate::harness::error::RegistryError;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{Ipv4Addr, SocketAddr};

/// A bound (not listening) loopback socket holding a port until released.
pub struct PortReservation {
    socket: Socket,
    addr: SocketAddr,
}

impl PortReservation {
    pub fn loopback() -> Result<Self, RegistryError> {
        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP)).map_err(|e| {
            RegistryError::PortReservation {
                message: format!("Failed to create TCP socket: {e}"),
            }
        })?;

        socket
            .set_reuse_address(true)
            .map_err(|e| RegistryError::PortReservation {
                message: format!("Failed to set SO_REUSEADDR: {e}"),
            })?;

        let bind_addr = SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0);
        socket
            .bind(&bind_addr.into())
            .map_err(|e| RegistryError::PortReservation {
                message: format!("Failed to bind TCP socket: {e}"),
            })?;

        let addr = socket
            .local_addr()
            .map_err(|e| RegistryError::PortReservation {
                message: format!("Failed to get local address: {e}"),
            })?
            .as_socket()
            .ok_or_else(|| RegistryError::PortReservation {
                message: "Socket address is not an IP address".to_string(),
            })?;

        Ok(Self { socket, addr })
    }

    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    pub fn release(self) {
        drop(self.socket);
    }
}
