use std::sync::Mutex;
use std::sync::PoisonError;

use tracing::warn;

use super::BindContext;
use super::Capability;
use crate::model::EntityKind;
use crate::model::EntityModel;
use crate::topics;
use crate::Error;

/// Numeric actuator capability for number entities.
///
/// Commands are parsed as floats and clamped to the model's range. A
/// payload that does not parse leaves the value unchanged.
#[derive(Debug)]
pub struct Level {
    value: Mutex<f64>,
}

impl Level {
    pub fn new(value: f64) -> Self {
        Self {
            value: Mutex::new(value),
        }
    }

    pub fn get(&self) -> f64 {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Change the value locally, without clamping.
    pub fn set(&self, value: f64) {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = value;
    }
}

impl Capability for Level {
    fn state(&self, _model: &EntityModel) -> Result<String, Error> {
        Ok(self.get().to_string())
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
        let value = match payload.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => value,
            _ => {
                warn!("Ignoring non-numeric command {:?} on {}", payload, topic);
                return;
            }
        };

        let value = match &model.kind {
            EntityKind::Number(number) => number.clamp(value),
            _ => value,
        };
        self.set(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NumberModel;

    fn setpoint() -> EntityModel {
        EntityModel::new(NumberModel {
            min: Some(30.0),
            max: Some(80.0),
            step: Some(0.5),
            ..Default::default()
        })
    }

    #[test]
    fn test_command_parses_and_clamps() {
        let level = Level::new(55.0);
        let model = setpoint();

        level.on_command(&model, "t", "62.5");
        assert_eq!(level.get(), 62.5);
        assert_eq!(level.state(&model).unwrap(), "62.5");

        level.on_command(&model, "t", "120");
        assert_eq!(level.get(), 80.0);
        assert_eq!(level.state(&model).unwrap(), "80");
    }

    #[test]
    fn test_unparsable_command_keeps_value() {
        let level = Level::new(55.0);
        let model = setpoint();

        level.on_command(&model, "t", "warm");
        level.on_command(&model, "t", "NaN");

        assert_eq!(level.get(), 55.0);
    }

    #[test]
    fn test_command_topic_follows_binding() {
        let level = Level::new(1.0);
        let mut model = setpoint();
        let ctx = BindContext {
            node_id: "boiler1",
            entity_id: "setpoint",
        };

        level.on_bind(&ctx, &mut model);
        assert_eq!(level.command_topics(&model), vec!["boiler1/setpoint/command"]);

        level.on_unbind(&mut model);
        assert!(level.command_topics(&model).is_empty());
    }
}
