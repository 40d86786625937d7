//! Sample subsystem plugin.
//!
//! Build with `cargo build` in this directory; the native loading test copies
//! the library to `libSample-subsystem.<ext>` and loads it from there.

use paramfw_core::prelude::*;

struct SampleSubsystem {
    name: String,
    path: String,
    channels: u32,
    resync: ResyncFlag,
}

impl Subsystem for SampleSubsystem {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &str {
        "SAMPLE"
    }

    fn need_resync(&mut self, consume: bool) -> bool {
        self.resync.check(consume)
    }

    fn fill_syncer_set(&self, syncer_set: &mut SyncerSet) {
        for channel in 0..self.channels {
            syncer_set.insert(format!("{}/channel{}", self.path, channel));
        }
    }
}

struct SampleBuilder;

impl SubsystemBuilder for SampleBuilder {
    fn build(&self, context: &SubsystemContext<'_>) -> Box<dyn Subsystem> {
        let channels = context
            .attribute("channels")
            .and_then(|c| c.parse().ok())
            .unwrap_or(1);

        let mut resync = ResyncFlag::default();
        // Hardware state is unknown until the first sync.
        resync.raise();

        Box::new(SampleSubsystem {
            name: context.name().to_string(),
            path: context.path(),
            channels,
            resync,
        })
    }
}

fn register(registry: &mut BuilderRegistry, logger: &Logger<'_>) {
    registry.register_builder("SAMPLE", Box::new(SampleBuilder));
    logger.info("SAMPLE subsystem builder registered");
}

paramfw_core::declare_subsystem_plugin!(getSAMPLESubsystemBuilder, register);
