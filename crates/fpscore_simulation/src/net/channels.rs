//! Command / Event каналы (очереди сообщений между instance)

use bevy::prelude::*;

use crate::character::PlayerCommand;
use crate::components::NetId;
use crate::weapon::WeaponCue;
use crate::log_warning;

/// Cosmetic notification authority → observers
///
/// Несёт ровно столько, сколько нужно для replay эффекта
/// (точки попаданий, fired/dry-fire, новый слот).
#[derive(Debug, Clone, PartialEq)]
pub struct CosmeticEvent {
    pub net_id: NetId,
    /// Fixed tick authority, на котором cue возник
    pub tick: u64,
    pub cue: WeaponCue,
}

/// Client → authority: fire / reload / swap запросы
#[derive(Resource, Debug, Default)]
pub struct CommandChannel {
    pub outgoing: Vec<PlayerCommand>,
    pub incoming: Vec<PlayerCommand>,
}

impl CommandChannel {
    pub fn send(&mut self, command: PlayerCommand) {
        self.outgoing.push(command);
    }

    pub fn take_outgoing(&mut self) -> Vec<PlayerCommand> {
        std::mem::take(&mut self.outgoing)
    }

    pub fn deliver(&mut self, commands: impl IntoIterator<Item = PlayerCommand>) {
        self.incoming.extend(commands);
    }

    pub fn take_incoming(&mut self) -> Vec<PlayerCommand> {
        std::mem::take(&mut self.incoming)
    }
}

/// Authority → observers: cosmetic events
///
/// `outgoing` живёт один тик: host забирает его (`take_outgoing` /
/// `deliver_events`) после каждого `app.update()`, иначе `broadcast_cues`
/// следующего тика его очистит.
#[derive(Resource, Debug, Default)]
pub struct EventChannel {
    pub outgoing: Vec<CosmeticEvent>,
    pub incoming: Vec<CosmeticEvent>,
}

impl EventChannel {
    pub fn publish(&mut self, event: CosmeticEvent) {
        self.outgoing.push(event);
    }

    pub fn take_outgoing(&mut self) -> Vec<CosmeticEvent> {
        std::mem::take(&mut self.outgoing)
    }

    pub fn deliver(&mut self, events: impl IntoIterator<Item = CosmeticEvent>) {
        self.incoming.extend(events);
    }

    pub fn take_incoming(&mut self) -> Vec<CosmeticEvent> {
        std::mem::take(&mut self.incoming)
    }
}

/// Перенести исходящие команды proxy в inbox authority
pub fn deliver_commands(proxy: &mut World, authority: &mut World) -> usize {
    let Some(mut outbox) = proxy.get_resource_mut::<CommandChannel>() else {
        return 0;
    };
    let commands = outbox.take_outgoing();
    let count = commands.len();

    match authority.get_resource_mut::<CommandChannel>() {
        Some(mut inbox) => inbox.deliver(commands),
        None => log_warning("deliver_commands: у authority нет CommandChannel"),
    }
    count
}

/// Разослать исходящие события authority всем observers
pub fn deliver_events(authority: &mut World, observers: &mut [&mut World]) -> usize {
    let Some(mut outbox) = authority.get_resource_mut::<EventChannel>() else {
        return 0;
    };
    let events = outbox.take_outgoing();

    for observer in observers.iter_mut() {
        if let Some(mut inbox) = observer.get_resource_mut::<EventChannel>() {
            inbox.deliver(events.iter().cloned());
        }
    }
    events.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::PlayerAction;

    fn fire(net_id: u64) -> PlayerCommand {
        PlayerCommand {
            net_id: NetId(net_id),
            action: PlayerAction::FireStart,
        }
    }

    #[test]
    fn test_deliver_commands_moves_outbox() {
        let mut proxy = World::new();
        let mut authority = World::new();
        proxy.init_resource::<CommandChannel>();
        authority.init_resource::<CommandChannel>();

        proxy.resource_mut::<CommandChannel>().send(fire(1));
        proxy.resource_mut::<CommandChannel>().send(fire(2));

        assert_eq!(deliver_commands(&mut proxy, &mut authority), 2);
        assert!(proxy.resource::<CommandChannel>().outgoing.is_empty());

        let incoming = authority.resource_mut::<CommandChannel>().take_incoming();
        assert_eq!(incoming, vec![fire(1), fire(2)]);
    }

    #[test]
    fn test_deliver_events_fans_out() {
        let mut authority = World::new();
        let mut first = World::new();
        let mut second = World::new();
        for world in [&mut authority, &mut first, &mut second] {
            world.init_resource::<EventChannel>();
        }

        authority.resource_mut::<EventChannel>().publish(CosmeticEvent {
            net_id: NetId(1),
            tick: 3,
            cue: WeaponCue::DryFire,
        });

        assert_eq!(deliver_events(&mut authority, &mut [&mut first, &mut second]), 1);
        assert_eq!(first.resource::<EventChannel>().incoming.len(), 1);
        assert_eq!(second.resource::<EventChannel>().incoming.len(), 1);
        assert!(authority.resource::<EventChannel>().outgoing.is_empty());
    }
}
