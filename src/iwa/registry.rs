//! Message Type Registry
//!
//! Maps numeric message type codes to the actions that decode and apply
//! them. Each document kind owns one [`MessageActions`] table, built once in
//! a `Lazy` static and extended from a shared base table. Message types
//! without an entry are skipped silently.

use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::sync::Arc;

use crate::iwa::archive::{ArchiveInfo, MessageInfo};
use crate::iwa::bundle::IwaContext;
use crate::iwa::Result;

/// A registered handler. It receives the message window (already limited to
/// the declared length), the record header, the message header, the parse
/// context and the callback target.
pub type Action<C> = dyn Fn(
        &mut dyn Read,
        &ArchiveInfo,
        &MessageInfo,
        &mut C,
        &mut <C as IwaContext>::Target,
    ) -> Result<()>
    + Send
    + Sync;

/// Table of actions keyed by message type code
pub struct MessageActions<C: IwaContext> {
    actions: HashMap<u32, Arc<Action<C>>>,
}

impl<C: IwaContext> MessageActions<C> {
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    /// Start from a copy of `base`; later registrations override it
    pub fn extend_from(base: &MessageActions<C>) -> Self {
        Self {
            actions: base.actions.clone(),
        }
    }

    /// Register a raw action that consumes the window itself
    pub fn set_raw_action<F>(&mut self, message_type: u32, action: F)
    where
        F: Fn(&mut dyn Read, &ArchiveInfo, &MessageInfo, &mut C, &mut C::Target) -> Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.actions.insert(message_type, Arc::new(action));
    }

    /// Register a handler that receives the decoded message `M`.
    ///
    /// The whole window is read and decoded before the handler runs; a
    /// malformed payload surfaces as [`crate::iwa::Error::Decode`].
    pub fn set_action<M, F>(&mut self, message_type: u32, handler: F)
    where
        M: prost::Message + Default + 'static,
        F: Fn(M, &ArchiveInfo, &MessageInfo, &mut C, &mut C::Target) -> Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.actions.insert(message_type, decoding_action(handler));
    }

    /// Register one handler under several type codes
    pub fn set_actions<M, F>(&mut self, message_types: &[u32], handler: F)
    where
        M: prost::Message + Default + 'static,
        F: Fn(M, &ArchiveInfo, &MessageInfo, &mut C, &mut C::Target) -> Result<()>
            + Send
            + Sync
            + 'static,
    {
        let action = decoding_action(handler);
        for &message_type in message_types {
            self.actions.insert(message_type, Arc::clone(&action));
        }
    }

    pub fn contains(&self, message_type: u32) -> bool {
        self.actions.contains_key(&message_type)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run the action registered for `info.type`, if any
    pub fn on_message(
        &self,
        reader: &mut dyn Read,
        archive: &ArchiveInfo,
        info: &MessageInfo,
        context: &mut C,
        target: &mut C::Target,
    ) -> Result<()> {
        match self.actions.get(&info.r#type) {
            Some(action) => action(reader, archive, info, context, target),
            None => {
                tracing::trace!(message_type = info.r#type, "no action registered");
                Ok(())
            },
        }
    }
}

impl<C: IwaContext> Default for MessageActions<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: IwaContext> Clone for MessageActions<C> {
    fn clone(&self) -> Self {
        Self::extend_from(self)
    }
}

impl<C: IwaContext> fmt::Debug for MessageActions<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.actions.keys().copied().collect();
        types.sort_unstable();
        f.debug_struct("MessageActions").field("types", &types).finish()
    }
}

fn decoding_action<C, M, F>(handler: F) -> Arc<Action<C>>
where
    C: IwaContext,
    M: prost::Message + Default + 'static,
    F: Fn(M, &ArchiveInfo, &MessageInfo, &mut C, &mut C::Target) -> Result<()> + Send + Sync + 'static,
{
    boxed(move |reader, archive, info, context, target| {
        let message = decode_message::<M>(reader)?;
        handler(message, archive, info, context, target)
    })
}

fn boxed<C, F>(action: F) -> Arc<Action<C>>
where
    C: IwaContext,
    F: Fn(&mut dyn Read, &ArchiveInfo, &MessageInfo, &mut C, &mut C::Target) -> Result<()>
        + Send
        + Sync
        + 'static,
{
    Arc::new(action)
}

/// Read the rest of a message window and decode it as `M`
pub fn decode_message<M: prost::Message + Default>(reader: &mut dyn Read) -> Result<M> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    Ok(M::decode(data.as_slice())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iwa::Error;
    use crate::iwa::callback::ParserCallback;
    use crate::iwa::protobuf::tsp::Reference;
    use once_cell::sync::Lazy;
    use prost::Message;
    use std::io::Cursor;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<u64>,
    }

    impl ParserCallback for Recorder {}

    static RECORDER_ACTIONS: Lazy<MessageActions<Recorder>> = Lazy::new(MessageActions::new);

    impl IwaContext for Recorder {
        type Target = Recorder;

        fn message_actions(&self) -> &'static MessageActions<Self> {
            &RECORDER_ACTIONS
        }
    }

    fn info(message_type: u32) -> MessageInfo {
        MessageInfo {
            r#type: message_type,
            ..Default::default()
        }
    }

    #[test]
    fn test_decoded_handler_receives_message() {
        let mut actions = MessageActions::<Recorder>::new();
        actions.set_action(10, |message: Reference, _, _, context: &mut Recorder, _| {
            context.seen.push(message.identifier);
            Ok(())
        });

        let payload = Reference { identifier: 99 }.encode_to_vec();
        let mut context = Recorder::default();
        let mut target = Recorder::default();
        actions
            .on_message(
                &mut Cursor::new(payload),
                &ArchiveInfo::default(),
                &info(10),
                &mut context,
                &mut target,
            )
            .unwrap();
        assert_eq!(context.seen, vec![99]);
    }

    #[test]
    fn test_unknown_type_is_ignored() {
        let actions = MessageActions::<Recorder>::new();
        let mut context = Recorder::default();
        let mut target = Recorder::default();
        let mut window = Cursor::new(vec![0xFF, 0xFF]);
        actions
            .on_message(&mut window, &ArchiveInfo::default(), &info(5), &mut context, &mut target)
            .unwrap();
        assert_eq!(window.position(), 0);
    }

    #[test]
    fn test_malformed_payload_is_decode_error() {
        let mut actions = MessageActions::<Recorder>::new();
        actions.set_action(10, |_: Reference, _, _, _: &mut Recorder, _| Ok(()));

        let mut context = Recorder::default();
        let mut target = Recorder::default();
        let result = actions.on_message(
            &mut Cursor::new(vec![0x0A, 0x05, 0x01]),
            &ArchiveInfo::default(),
            &info(10),
            &mut context,
            &mut target,
        );
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_extend_from_overrides() {
        let mut base = MessageActions::<Recorder>::new();
        base.set_actions(&[1, 2], |_: Reference, _, _, context: &mut Recorder, _| {
            context.seen.push(0);
            Ok(())
        });

        let mut derived = MessageActions::extend_from(&base);
        derived.set_action(2, |_: Reference, _, _, context: &mut Recorder, _| {
            context.seen.push(2);
            Ok(())
        });
        assert_eq!(derived.len(), 2);
        assert!(base.contains(1) && derived.contains(1));

        let mut context = Recorder::default();
        let mut target = Recorder::default();
        for actions in [&base, &derived] {
            actions
                .on_message(
                    &mut Cursor::new(Vec::new()),
                    &ArchiveInfo::default(),
                    &info(2),
                    &mut context,
                    &mut target,
                )
                .unwrap();
        }
        assert_eq!(context.seen, vec![0, 2]);
    }
}
