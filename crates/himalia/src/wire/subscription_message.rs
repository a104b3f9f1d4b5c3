/*
 * subscription_message.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use crate::error::Error;
use crate::socket::socket::Socket;

/// Represents a special `SubscriptionMessage` sent from a SUB to an XPUB
/// upon `socket.set_subscribe(subscription)` or `socket.set_unsubscribe(subscription)`.
#[derive(Debug, PartialEq)]
pub struct SubscriptionMessage {
    pub kind: SubscriptionKind,
    pub subscription: String,
}

#[derive(Debug, PartialEq)]
pub enum SubscriptionKind {
    Subscribe,
    Unsubscribe,
}

impl SubscriptionMessage {
    /// Read a SubscriptionMessage from a ZeroMQ socket.
    pub fn read_from_socket(socket: &Socket) -> crate::Result<SubscriptionMessage> {
        let bufs = socket.recv_multipart()?;
        Self::from_buffers(bufs)
    }

    /// Parse a SubscriptionMessage from an array of buffers (from a ZeroMQ message)
    ///
    /// Always a single frame: `1{subscription}` to subscribe, `0{subscription}`
    /// to unsubscribe.
    pub fn from_buffers(bufs: Vec<Vec<u8>>) -> crate::Result<SubscriptionMessage> {
        let [buf] = bufs.as_slice() else {
            let n = bufs.len();
            return Err(crate::anyhow!(
                "Subscription message on XPUB must be a single frame. {n} frames were received."
            ));
        };

        let Some((&first, rest)) = buf.split_first() else {
            return Err(crate::anyhow!(
                "Subscription message on XPUB must be at least length 1 to determine subscribe/unsubscribe."
            ));
        };

        let kind = if first == 1 {
            SubscriptionKind::Subscribe
        } else {
            SubscriptionKind::Unsubscribe
        };

        let subscription = match std::str::from_utf8(rest) {
            Ok(subscription) => subscription.to_string(),
            Err(err) => {
                return Err(Error::Utf8Error(
                    String::from("subscription"),
                    rest.to_vec(),
                    err,
                ))
            },
        };

        Ok(Self { kind, subscription })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_subscribe_frame() {
        let msg = SubscriptionMessage::from_buffers(vec![vec![1]]).unwrap();
        assert_eq!(msg.kind, SubscriptionKind::Subscribe);
        assert_eq!(msg.subscription, "");

        let msg = SubscriptionMessage::from_buffers(vec![b"\x00topic".to_vec()]).unwrap();
        assert_eq!(msg.kind, SubscriptionKind::Unsubscribe);
        assert_eq!(msg.subscription, "topic");
    }

    #[test]
    fn test_malformed_frames() {
        assert_matches!(SubscriptionMessage::from_buffers(vec![]), Err(Error::Anyhow(_)));
        assert_matches!(
            SubscriptionMessage::from_buffers(vec![vec![1], vec![1]]),
            Err(Error::Anyhow(_))
        );
        assert_matches!(
            SubscriptionMessage::from_buffers(vec![vec![]]),
            Err(Error::Anyhow(_))
        );
        assert_matches!(
            SubscriptionMessage::from_buffers(vec![vec![1, 0xff]]),
            Err(Error::Utf8Error(..))
        );
    }
}
