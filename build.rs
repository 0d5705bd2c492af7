//! Forwards `STATION_*` settings from a local `.env` file into the compile-time
//! environment so `StationConfig::from_build_env` can pick them up.

const PREFIX: &str = "STATION_";

const KNOWN_KEYS: [&str; 11] = [
    "STATION_WIFI_SSID",
    "STATION_WIFI_PASSWORD",
    "STATION_DEVICE_NAME",
    "STATION_TELEMETRY_HOST",
    "STATION_TELEMETRY_PORT",
    "STATION_TELEMETRY_PATH",
    "STATION_COMMAND_HOST",
    "STATION_COMMAND_PORT",
    "STATION_COMMAND_PATH",
    "STATION_SAMPLE_PERIOD_MS",
    "STATION_IO_TIMEOUT_MS",
];

fn main() {
    println!("cargo:rerun-if-changed=.env");
    for key in KNOWN_KEYS {
        println!("cargo:rerun-if-env-changed={key}");
    }

    let Ok(entries) = dotenvy::dotenv_iter() else {
        return;
    };

    for (key, value) in entries.flatten() {
        // Variables already set in the real environment take precedence.
        if key.starts_with(PREFIX) && std::env::var_os(&key).is_none() {
            println!("cargo:rustc-env={key}={value}");
        }
    }
}
