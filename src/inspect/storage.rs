use super::InspectEnv;
use crate::report::Section;

pub fn storage(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("storage", "Storage");
    s.output(
        "df",
        &env.run("df", &["-h", "-x", "tmpfs", "-x", "devtmpfs"]),
    );
    s.output(
        "lsblk",
        &env.run("lsblk", &["-o", "NAME,SIZE,TYPE,FSTYPE,MOUNTPOINT"]),
    );

    if let Some(cid) = env.read("sys/block/mmcblk0/device/name") {
        s.field("SD card", cid);
    }
    for row in env.lshw_class("disk") {
        s.text(row);
    }
    s
}

pub fn usb(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("usb", "USB");
    s.output("lsusb", &env.run("lsusb", &[]));
    s.output("lsusb -t", &env.run("lsusb", &["-t"]));
    s
}

pub fn lshw(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("lshw", "Hardware list");
    match env.lshw_short() {
        Some(listing) => s.block(&listing),
        None => s.unavailable("lshw -short"),
    };
    s
}
