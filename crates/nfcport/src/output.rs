use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use nfcport_device::{FirmwareVersion, PollingResponse, SessionCommand, StatusWord};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FirmwareOutput {
    overall_fw: String,
    mcu_fw: String,
    sam_fw: String,
    rffe_fw: String,
    rffe_eeprom: String,
    bootloader: String,
    fw_update_state: String,
    boot_state: u16,
    status: String,
}

impl From<&FirmwareVersion> for FirmwareOutput {
    fn from(fw: &FirmwareVersion) -> Self {
        Self {
            overall_fw: format!("{:08X}", fw.overall_fw),
            mcu_fw: format!("{:04X}", fw.mcu_fw),
            sam_fw: format!("{:04X}", fw.sam_fw),
            rffe_fw: format!("{:04X}", fw.rffe_fw),
            rffe_eeprom: format!("{:04X}", fw.rffe_eeprom),
            bootloader: format!("{:04X}", fw.bootloader),
            fw_update_state: format!("{:04X}", fw.fw_update_state),
            boot_state: fw.boot_state,
            status: fw.status_word().to_string(),
        }
    }
}

impl FirmwareOutput {
    fn rows(&self) -> [(&'static str, String); 9] {
        [
            ("Overall", self.overall_fw.clone()),
            ("MCU", self.mcu_fw.clone()),
            ("SAM", self.sam_fw.clone()),
            ("RFFE", self.rffe_fw.clone()),
            ("RFFE EEPROM", self.rffe_eeprom.clone()),
            ("Bootloader", self.bootloader.clone()),
            ("FW update state", self.fw_update_state.clone()),
            ("Boot state", self.boot_state.to_string()),
            ("Status", self.status.clone()),
        ]
    }
}

#[derive(Serialize)]
struct CardOutput {
    system_code: String,
    idm: String,
    pmm: String,
    request_data: Option<String>,
}

#[derive(Serialize)]
struct SessionOutput<'a> {
    command: &'a str,
    status: String,
    success: bool,
}

pub fn print_firmware(fw: &FirmwareVersion, format: OutputFormat) {
    let out = FirmwareOutput::from(fw);
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => print_table(&["FIELD", "VALUE"], out.rows()),
        OutputFormat::Pretty => {
            println!("Firmware:");
            for (name, value) in out.rows() {
                println!("  {:<17}{value}", format!("{name}:"));
            }
        }
        OutputFormat::Raw => println!("{}", out.overall_fw),
    }
}

pub fn print_card(system_code: u16, card: &PollingResponse, format: OutputFormat) {
    let out = CardOutput {
        system_code: format!("{system_code:04X}"),
        idm: card.idm_hex(),
        pmm: card.pmm_hex(),
        request_data: card.request_data.map(|rd| format!("{:02X}{:02X}", rd[0], rd[1])),
    };
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => {
            let mut rows = vec![
                ("System code", out.system_code.clone()),
                ("IDm", out.idm.clone()),
                ("PMm", out.pmm.clone()),
            ];
            if let Some(rd) = &out.request_data {
                rows.push(("Request data", rd.clone()));
            }
            print_table(&["FIELD", "VALUE"], rows);
        }
        OutputFormat::Pretty => {
            println!("idm={} pmm={} system_code={}", out.idm, out.pmm, out.system_code);
        }
        OutputFormat::Raw => print_raw(&card.idm),
    }
}

pub fn print_session(command: SessionCommand, sw: StatusWord, format: OutputFormat) {
    let out = SessionOutput {
        command: command.name(),
        status: sw.to_string(),
        success: sw.is_success(),
    };
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => print_table(
            &["COMMAND", "STATUS"],
            [(command.name(), out.status.clone())],
        ),
        OutputFormat::Pretty => println!("{}: {}", out.command, out.status),
        OutputFormat::Raw => print_raw(&[sw.sw1, sw.sw2]),
    }
}

fn print_json(out: &impl Serialize) {
    println!(
        "{}",
        serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
    );
}

fn print_table(header: &[&str], rows: impl IntoIterator<Item = (&'static str, String)>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    for (name, value) in rows {
        table.add_row(vec![name.to_string(), value]);
    }
    println!("{table}");
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}
