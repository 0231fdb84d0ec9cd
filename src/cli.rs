use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a module and print its result as JSON
    Run {
        /// name of the module to execute: terraform_output or os_floating_ip_info
        module_name: String,

        /// the module's options as json string: -i '{"opt1": "val1", "opt2": "val2"}'
        /// should match module schema, to get schema run: `schema module_name`
        #[arg(short, long, value_name = "JSON")]
        inputs: String,
    },

    /// Print a module's input schema in JSON format
    Schema {
        /// name of the module
        module_name: String,
    },

    /// Print every group a host belongs to, given its directly assigned groups
    ExpandGroups {
        /// directly assigned group, may be repeated
        #[arg(short, long = "group", value_name = "GROUP")]
        groups: Vec<String>,

        /// YAML or JSON file mapping parent groups to their child groups
        #[arg(short, long, value_name = "FILE")]
        map: Option<PathBuf>,
    },

    /// Build a YAML inventory from saved `terraform output -json` results
    Inventory {
        /// file containing the JSON printed by `terraform output -json`
        #[arg(short, long, value_name = "FILE")]
        outputs: PathBuf,

        /// name of the output holding the hosts and their groups
        #[arg(short, long)]
        key: Option<String>,

        /// YAML or JSON file mapping parent groups to their child groups
        #[arg(short, long, value_name = "FILE")]
        map: Option<PathBuf>,
    },
}
