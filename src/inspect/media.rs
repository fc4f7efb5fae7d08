use super::InspectEnv;
use crate::context::DisplayDriver;
use crate::report::Section;

pub fn audio(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("audio", "Audio");
    s.output_or(
        "aplay -l",
        &env.run("aplay", &["-l"]),
        "No playback devices",
    );
    for row in env.lshw_class("multimedia") {
        s.text(row);
    }
    s
}

pub fn video_kms(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("video-kms", "Video (KMS)");
    s.field("Driver", driver_name(env.ctx.board.display));
    s.output("kmsprint", &env.run("kmsprint", &[]));
    s
}

pub fn video_legacy(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("video-legacy", "Video (firmware)");
    s.field("Driver", driver_name(env.ctx.board.display));
    s.output("tvservice -s", &env.run("tvservice", &["-s"]));
    s.output("tvservice -n", &env.run("tvservice", &["-n"]));
    s
}

fn driver_name(driver: DisplayDriver) -> &'static str {
    match driver {
        DisplayDriver::Kms => "vc4-kms-v3d",
        DisplayDriver::FakeKms => "vc4-fkms-v3d",
        DisplayDriver::Legacy => "firmware (no DRM overlay)",
        DisplayDriver::Headless => "none",
    }
}
