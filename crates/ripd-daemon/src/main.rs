// Copyright 2025 Cedric Hammes
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

pub mod config;
pub mod daemon;
pub mod render;
pub mod transport;

use std::process::exit;

use colorful::{Color, Colorful};
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;

#[tokio::main]
async fn main() {
    if let Err(error) = SimpleLogger::new().with_level(LevelFilter::Info).init() {
        println!("Unable to initialize logging => {}", error);
        exit(-1);
    }

    let header = r#" ____  ___ ____     ____
|  _ \|_ _|  _ \ __| _ \
| |_) || || |_) / _` |_) |
|  _ < | ||  __/ (_|  __/
|_| \_\___|_|   \__,_|
   Single-node distance-vector routing daemon"#;
    println!("{}\n", header.gradient(Color::Green).bold());

    let Some(path) = std::env::args().nth(1) else {
        error!("Usage: ripd <config-file>");
        exit(-1);
    };

    let config = match config::load(&path) {
        Ok(config) => config,
        Err(error) => {
            error!("Invalid configuration file => {error}");
            exit(-1);
        }
    };

    info!(
        "Starting router {} with {} input port(s) and {} neighbor(s)",
        config.router_id,
        config.inputs.len(),
        config.outputs.len()
    );

    if let Err(error) = daemon::run(config).await {
        error!("Daemon exited with an error => {error}");
        exit(-1);
    }
}
