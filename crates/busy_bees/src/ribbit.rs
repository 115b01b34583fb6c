use bevy::log::info;
use bevy::prelude::*;
use bits_helpers::RibbitMessageHandler;
use ribbit_bits::{BitDuration, BitResult};

use crate::GameState;
use crate::session::{EndReason, Session};

#[derive(Default, Clone, Copy)]
pub struct BusyBees;

impl RibbitMessageHandler for BusyBees {
    fn restart(world: &mut World) {
        info!("Restarting BusyBees");

        world.resource_mut::<Session>().restart();

        let mut next_state = world.resource_mut::<NextState<GameState>>();
        next_state.set(GameState::Welcome);
    }

    fn end(world: &mut World) -> BitResult {
        info!("Ending BusyBees");

        let matched = {
            let mut session = world.resource_mut::<Session>();
            session.end(EndReason::Host);
            session.matched()
        };

        if *world.resource::<State<GameState>>().get() != GameState::Over {
            world
                .resource_mut::<NextState<GameState>>()
                .set(GameState::Over);
        }

        BitResult::HighestScore(matched.into())
    }

    fn duration(_world: &mut World) -> BitDuration {
        BitDuration::max_duration()
    }
}
