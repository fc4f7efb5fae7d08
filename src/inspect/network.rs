use super::InspectEnv;
use crate::report::Section;

pub fn network(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("network", "Network");
    s.output("ip -brief address", &env.run("ip", &["-brief", "address"]));
    s.output_or("ip route", &env.run("ip", &["route"]), "No routes");
    for row in env.lshw_class("network") {
        s.text(row);
    }
    s
}

pub fn wifi(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("wifi", "Wireless");
    if let Some(country) = env
        .run("iw", &["reg", "get"])
        .output()
        .and_then(regulatory_country)
    {
        s.field("Country", country);
    }
    s.output("iwconfig", &env.run("iwconfig", &[]));
    s
}

pub fn bluetooth(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("bluetooth", "Bluetooth");
    s.output("bluetoothctl show", &env.run("bluetoothctl", &["show"]));
    s
}

pub fn nfs(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("nfs", "NFS exports");
    s.output("showmount -e", &env.run("showmount", &["-e", "localhost"]));
    s
}

pub fn samba(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("samba", "Samba shares");
    let inv = env.run("testparm", &["-s", "--suppress-prompt"]);
    match inv.output() {
        Some(out) => {
            for share in samba_shares(out) {
                s.text(share);
            }
            if s.is_empty() {
                s.text("No shares defined");
            }
        }
        None => {
            s.output("testparm", &inv);
        }
    }
    s
}

/// `country GB: DFS-ETSI` -> `GB`
fn regulatory_country(output: &str) -> Option<String> {
    output.lines().find_map(|l| {
        let rest = l.trim().strip_prefix("country ")?;
        Some(rest.split(':').next()?.trim().to_string())
    })
}

fn samba_shares(dump: &str) -> Vec<String> {
    dump.lines()
        .filter_map(|l| {
            let name = l.trim().strip_prefix('[')?.strip_suffix(']')?;
            (name != "global").then(|| name.to_string())
        })
        .collect()
}
