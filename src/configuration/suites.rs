//! Case tables shipped inside the binary.

use clap::arg_enum;

const CORE: &str = include_str!("../../suites/core.yaml");
const STUDENT: &str = include_str!("../../suites/student.yaml");
const DASHBOARDS: &str = include_str!("../../suites/dashboards.yaml");

arg_enum! {
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum Suite {
        All,
        Core,
        Student,
        Dashboards,
    }
}

impl Suite {
    /// YAML manifests making up the suite, in run order.
    pub fn sources(self) -> Vec<&'static str> {
        match self {
            Suite::All => vec![CORE, STUDENT, DASHBOARDS],
            Suite::Core => vec![CORE],
            Suite::Student => vec![STUDENT],
            Suite::Dashboards => vec![DASHBOARDS],
        }
    }
}
