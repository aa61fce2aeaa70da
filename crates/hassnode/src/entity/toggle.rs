use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use tracing::warn;

use super::BindContext;
use super::Capability;
use crate::model::EntityModel;
use crate::topics;
use crate::Error;

/// What a [`Toggle`] does with a command that matches neither on/off payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnrecognizedPayload {
    /// Anything that is not the "on" payload switches off.
    #[default]
    TurnOff,
    /// Ignore the command and keep the current state.
    KeepState,
}

/// Two-state capability for switches, lights, fans and binary sensors.
///
/// Kinds that accept commands get a command topic while bound. Binary
/// sensors have none, so the state only changes through [`Toggle::set`].
#[derive(Debug, Default)]
pub struct Toggle {
    on: AtomicBool,
    unrecognized: UnrecognizedPayload,
}

impl Toggle {
    pub fn new(on: bool) -> Self {
        Self {
            on: AtomicBool::new(on),
            unrecognized: UnrecognizedPayload::default(),
        }
    }

    pub fn with_unrecognized(mut self, policy: UnrecognizedPayload) -> Self {
        self.unrecognized = policy;
        self
    }

    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }

    /// Change the state locally. Call `Entity::publish_state` to report it.
    pub fn set(&self, on: bool) {
        self.on.store(on, Ordering::SeqCst);
    }
}

impl Capability for Toggle {
    fn state(&self, model: &EntityModel) -> Result<String, Error> {
        let payloads = model.kind.on_off_payloads();
        Ok(if self.is_on() {
            payloads.state_on
        } else {
            payloads.state_off
        })
    }

    fn on_bind(&self, ctx: &BindContext<'_>, model: &mut EntityModel) {
        model
            .kind
            .set_command_topic(Some(topics::command_topic(ctx.node_id, ctx.entity_id)));
    }

    fn on_unbind(&self, model: &mut EntityModel) {
        model.kind.set_command_topic(None);
    }

    fn command_topics(&self, model: &EntityModel) -> Vec<String> {
        model.command_topic().map(str::to_string).into_iter().collect()
    }

    fn on_command(&self, model: &EntityModel, topic: &str, payload: &str) {
        let payloads = model.kind.on_off_payloads();
        if payload == payloads.command_on {
            self.set(true);
        } else if payload == payloads.command_off {
            self.set(false);
        } else {
            warn!("Unrecognized command {:?} on {}", payload, topic);
            if self.unrecognized == UnrecognizedPayload::TurnOff {
                self.set(false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BinarySensorModel;
    use crate::model::LightModel;
    use crate::model::SwitchModel;

    const CTX: BindContext<'static> = BindContext {
        node_id: "boiler1",
        entity_id: "relay1",
    };

    #[test]
    fn test_command_topic_follows_binding() {
        let toggle = Toggle::new(false);
        let mut model = EntityModel::new(SwitchModel::default());

        toggle.on_bind(&CTX, &mut model);
        assert_eq!(model.command_topic(), Some("boiler1/relay1/command"));
        assert_eq!(toggle.command_topics(&model), vec!["boiler1/relay1/command"]);

        toggle.on_unbind(&mut model);
        assert_eq!(model.command_topic(), None);
        assert!(toggle.command_topics(&model).is_empty());
    }

    #[test]
    fn test_binary_sensor_has_no_command_topic() {
        let toggle = Toggle::new(true);
        let mut model = EntityModel::new(BinarySensorModel::default());

        toggle.on_bind(&CTX, &mut model);

        assert!(toggle.command_topics(&model).is_empty());
        assert_eq!(toggle.state(&model).unwrap(), "ON");
    }

    #[test]
    fn test_custom_payloads() {
        let toggle = Toggle::new(false);
        let model = EntityModel::new(SwitchModel {
            payload_on: Some("1".to_string()),
            payload_off: Some("0".to_string()),
            state_on: Some("running".to_string()),
            ..Default::default()
        });

        assert_eq!(toggle.state(&model).unwrap(), "0");
        toggle.on_command(&model, "t", "1");
        assert!(toggle.is_on());
        assert_eq!(toggle.state(&model).unwrap(), "running");
        toggle.on_command(&model, "t", "0");
        assert!(!toggle.is_on());
    }

    #[test]
    fn test_unrecognized_payload_policy() {
        let model = EntityModel::new(LightModel::default());

        let toggle = Toggle::new(true);
        toggle.on_command(&model, "t", "toggle");
        assert!(!toggle.is_on());

        let toggle = Toggle::new(true).with_unrecognized(UnrecognizedPayload::KeepState);
        toggle.on_command(&model, "t", "toggle");
        assert!(toggle.is_on());
    }
}
