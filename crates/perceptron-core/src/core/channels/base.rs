use super::source::LineSource;
use super::types::ChannelType;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, BufRead};

/// A typed source of text lines.
pub struct InfoChannel {
    channel_type: ChannelType,
    source: Box<dyn LineSource>,
}

impl InfoChannel {
    pub fn new(channel_type: ChannelType, source: impl LineSource + 'static) -> Self {
        Self {
            channel_type,
            source: Box::new(source),
        }
    }

    pub fn from_boxed(channel_type: ChannelType, source: Box<dyn LineSource>) -> Self {
        Self {
            channel_type,
            source,
        }
    }

    pub fn channel_type(&self) -> ChannelType {
        self.channel_type
    }

    pub fn locator(&self) -> String {
        self.source.locator()
    }

    pub fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
        self.source.open()
    }

    pub fn can_be_read(&self) -> bool {
        self.source.can_be_read()
    }
}

impl fmt::Debug for InfoChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfoChannel")
            .field("channel_type", &self.channel_type)
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for InfoChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} channel '{}'", self.channel_type, self.source.locator())
    }
}

/// Registry of information channels, indexed by channel type.
#[derive(Debug, Default)]
pub struct InfoChannelBase {
    channels: Vec<InfoChannel>,
    by_type: BTreeMap<ChannelType, Vec<usize>>,
}

impl InfoChannelBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_channel(&mut self, channel: InfoChannel) {
        let index = self.channels.len();
        self.by_type
            .entry(channel.channel_type())
            .or_default()
            .push(index);
        self.channels.push(channel);
    }

    pub fn with_channel(mut self, channel: InfoChannel) -> Self {
        self.add_channel(channel);
        self
    }

    pub fn channels(&self) -> &[InfoChannel] {
        &self.channels
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// The distinct channel types that have at least one channel, in ascending order.
    pub fn channel_types(&self) -> impl Iterator<Item = ChannelType> + '_ {
        self.by_type.keys().copied()
    }

    pub fn has_type(&self, channel_type: ChannelType) -> bool {
        self.by_type.contains_key(&channel_type)
    }

    /// Channels of exactly the given type, in registration order.
    pub fn channels_of_type(
        &self,
        channel_type: ChannelType,
    ) -> impl Iterator<Item = &InfoChannel> + '_ {
        self.by_type
            .get(&channel_type)
            .map(|indices| indices.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|&i| &self.channels[i])
    }
}

impl Extend<InfoChannel> for InfoChannelBase {
    fn extend<T: IntoIterator<Item = InfoChannel>>(&mut self, iter: T) {
        for channel in iter {
            self.add_channel(channel);
        }
    }
}

impl FromIterator<InfoChannel> for InfoChannelBase {
    fn from_iter<T: IntoIterator<Item = InfoChannel>>(iter: T) -> Self {
        let mut base = Self::new();
        base.extend(iter);
        base
    }
}
