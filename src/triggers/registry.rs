use heapless::Vec;

use super::types::{ClientId, TriggerParams, TriggerPayload, NO_CLIENT, TRIGGER_SLOT_COUNT};
use crate::{
    error::RoamError,
    services::{EventSink, FirmwareLink, UpwardEvent},
};

pub type InternalHandler<C> = fn(&mut C, &TriggerPayload);

/// Who consumes a slot's events. Internal handlers run synchronously inside the
/// dispatch step; external clients only ever see an upward event.
pub enum TriggerBinding<C> {
    Internal(InternalHandler<C>),
    External(ClientId),
}

impl<C> Clone for TriggerBinding<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for TriggerBinding<C> {}

impl<C> TriggerBinding<C> {
    fn owner(&self) -> SlotOwner {
        match self {
            Self::Internal(_) => SlotOwner::Internal,
            Self::External(client_id) => SlotOwner::External(*client_id),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotOwner {
    Free,
    Internal,
    External(ClientId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotSnapshot {
    pub slot: u8,
    pub owner: SlotOwner,
    pub dispatched: u32,
}

/// Binds firmware comparator slots to their consumers.
pub struct TriggerRegistry<C> {
    slots: [Option<TriggerBinding<C>>; TRIGGER_SLOT_COUNT],
    dispatched: [u32; TRIGGER_SLOT_COUNT],
}

impl<C: EventSink> TriggerRegistry<C> {
    pub const fn new() -> Self {
        Self {
            slots: [None; TRIGGER_SLOT_COUNT],
            dispatched: [0; TRIGGER_SLOT_COUNT],
        }
    }

    /// Binds `binding` and re-arms the firmware comparator for the chosen slot.
    ///
    /// Internal bindings land exactly at `slot_id`. External bindings ignore it
    /// and take the slot the client already owns, else the first free one.
    pub fn register<F>(
        &mut self,
        slot_id: u8,
        binding: TriggerBinding<C>,
        params: &TriggerParams,
        firmware: &mut F,
    ) -> Result<u8, RoamError>
    where
        F: FirmwareLink + ?Sized,
    {
        let index = match binding {
            TriggerBinding::Internal(_) => {
                let index = slot_index(slot_id)?;
                if let Some(TriggerBinding::External(client_id)) = self.slots[index] {
                    warn!(
                        "trigger slot {} owned by client {}, internal handler refused",
                        slot_id, client_id
                    );
                    return Err(RoamError::SlotTaken(slot_id));
                }
                index
            }
            TriggerBinding::External(NO_CLIENT) => {
                error!("trigger register rejected: client id {}", NO_CLIENT);
                return Err(RoamError::InvalidClient);
            }
            TriggerBinding::External(client_id) => self.client_slot(client_id)?,
        };

        let previous = self.slots[index].replace(binding);
        let slot = index as u8;
        if let Err(err) = firmware.arm_trigger(slot, params) {
            error!("arming trigger slot {} failed: {}", slot, err);
            self.slots[index] = previous;
            return Err(err);
        }

        debug!("trigger slot {} bound to {:?}", slot, binding.owner());
        Ok(slot)
    }

    fn client_slot(&self, client_id: ClientId) -> Result<usize, RoamError> {
        let owned = self
            .slots
            .iter()
            .position(|slot| matches!(slot, Some(TriggerBinding::External(id)) if *id == client_id));
        if let Some(index) = owned {
            return Ok(index);
        }

        self.slots.iter().position(Option::is_none).ok_or_else(|| {
            warn!("trigger registry full; client {} rejected", client_id);
            RoamError::RegistryFull
        })
    }

    pub fn unregister<F>(&mut self, slot_id: u8, firmware: &mut F) -> Result<(), RoamError>
    where
        F: FirmwareLink + ?Sized,
    {
        let index = slot_index(slot_id)?;
        if self.slots[index].take().is_none() {
            warn!("unregister of free trigger slot {}", slot_id);
            return Err(RoamError::UnboundSlot(slot_id));
        }
        self.dispatched[index] = 0;
        firmware.disarm_trigger(slot_id);
        Ok(())
    }

    /// Releases whichever slot `client_id` owns.
    pub fn unregister_client<F>(
        &mut self,
        client_id: ClientId,
        firmware: &mut F,
    ) -> Result<u8, RoamError>
    where
        F: FirmwareLink + ?Sized,
    {
        let index = self
            .slots
            .iter()
            .position(|slot| matches!(slot, Some(TriggerBinding::External(id)) if *id == client_id))
            .filter(|_| client_id != NO_CLIENT)
            .ok_or(RoamError::InvalidClient)?;
        let slot = index as u8;
        self.unregister(slot, firmware)?;
        Ok(slot)
    }

    /// Routes a firmware link-quality event to its consumer.
    pub fn dispatch(
        &mut self,
        slot_id: u8,
        payload: &TriggerPayload,
        ctx: &mut C,
    ) -> Result<(), RoamError> {
        let index = slot_index(slot_id)?;
        let Some(binding) = self.slots[index] else {
            warn!("trigger event on unbound slot {}", slot_id);
            return Err(RoamError::UnboundSlot(slot_id));
        };
        self.dispatched[index] = self.dispatched[index].saturating_add(1);

        match binding {
            TriggerBinding::Internal(handler) => handler(ctx, payload),
            TriggerBinding::External(client_id) => ctx.deliver(UpwardEvent::ExternalTrigger {
                client_id,
                slot: slot_id,
                payload: *payload,
            }),
        }
        Ok(())
    }

    pub fn owner(&self, slot_id: u8) -> Result<SlotOwner, RoamError> {
        let index = slot_index(slot_id)?;
        Ok(self.slots[index]
            .as_ref()
            .map_or(SlotOwner::Free, TriggerBinding::owner))
    }

    pub fn dump(&self) -> Vec<SlotSnapshot, TRIGGER_SLOT_COUNT> {
        let mut out = Vec::new();
        for (index, slot) in self.slots.iter().enumerate() {
            let snapshot = SlotSnapshot {
                slot: index as u8,
                owner: slot.as_ref().map_or(SlotOwner::Free, TriggerBinding::owner),
                dispatched: self.dispatched[index],
            };
            info!(
                "trigger slot {}: {:?} dispatched={}",
                snapshot.slot, snapshot.owner, snapshot.dispatched
            );
            let _ = out.push(snapshot);
        }
        out
    }
}

impl<C: EventSink> Default for TriggerRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

fn slot_index(slot_id: u8) -> Result<usize, RoamError> {
    let index = usize::from(slot_id);
    if index >= TRIGGER_SLOT_COUNT {
        warn!("trigger slot {} out of range", slot_id);
        return Err(RoamError::InvalidSlot(slot_id));
    }
    Ok(index)
}
