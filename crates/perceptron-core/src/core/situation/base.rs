use super::Situation;
use crate::core::channels::{ChannelType, InfoChannelBase};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SituationBaseError {
    #[error("A situation named '{0}' is already registered")]
    DuplicateRefName(String),
}

/// Collection of known situations, indexed by the channel types their
/// circumstances consume.
#[derive(Debug, Default)]
pub struct SituationBase {
    situations: Vec<Situation>,
    by_type: BTreeMap<ChannelType, Vec<usize>>,
    next_ref: usize,
}

impl SituationBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a situation, assigning `situation-<n>` when its reference
    /// name is empty.
    pub fn add_situation(
        &mut self,
        mut situation: Situation,
    ) -> Result<&Situation, SituationBaseError> {
        if situation.ref_name.trim().is_empty() {
            situation.ref_name = self.next_generated_name();
        } else if self.get(&situation.ref_name).is_some() {
            return Err(SituationBaseError::DuplicateRefName(situation.ref_name));
        }

        let index = self.situations.len();
        for channel_type in situation.channel_types() {
            self.by_type.entry(channel_type).or_default().push(index);
        }
        self.situations.push(situation);
        Ok(&self.situations[index])
    }

    fn next_generated_name(&mut self) -> String {
        loop {
            self.next_ref += 1;
            let name = format!("situation-{}", self.next_ref);
            if self.get(&name).is_none() {
                return name;
            }
        }
    }

    pub fn situations(&self) -> &[Situation] {
        &self.situations
    }

    pub fn situation_count(&self) -> usize {
        self.situations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.situations.is_empty()
    }

    pub fn get(&self, ref_name: &str) -> Option<&Situation> {
        self.situations.iter().find(|s| s.ref_name == ref_name)
    }

    /// Channel types referenced by at least one situation, ascending.
    pub fn channel_types(&self) -> impl Iterator<Item = ChannelType> + '_ {
        self.by_type.keys().copied()
    }

    /// Situations with at least one circumstance compatible with
    /// `channel_type`, in registration order.
    pub fn situations_for_type(&self, channel_type: ChannelType) -> Vec<&Situation> {
        self.indices_for_type(channel_type)
            .into_iter()
            .map(|i| &self.situations[i])
            .collect()
    }

    fn indices_for_type(&self, channel_type: ChannelType) -> BTreeSet<usize> {
        self.by_type
            .iter()
            .filter(|(t, _)| t.is_compatible_with(channel_type))
            .flat_map(|(_, indices)| indices.iter().copied())
            .collect()
    }

    /// Situations that can be assessed with the given channels: those with at
    /// least one circumstance whose channel type is compatible with a type
    /// present in `channels`. Registration order is preserved.
    pub fn relevant_situations(&self, channels: &InfoChannelBase) -> Vec<&Situation> {
        let indices: BTreeSet<usize> = channels
            .channel_types()
            .flat_map(|t| self.indices_for_type(t))
            .collect();
        debug!(
            relevant = indices.len(),
            total = self.situations.len(),
            "Selected relevant situations."
        );
        indices.into_iter().map(|i| &self.situations[i]).collect()
    }
}
