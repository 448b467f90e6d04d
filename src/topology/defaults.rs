//! Embedded default plant
//! Location: src/topology/defaults.rs

use super::{LineSpec, MachineSpec, TagSpec, TopologySpec};

/// Two lines, four machines, nine tags
pub fn default_topology() -> TopologySpec {
    TopologySpec {
        lines: vec![
            LineSpec {
                name: "Line1".to_string(),
                machines: vec![
                    MachineSpec {
                        name: "Machine1".to_string(),
                        tags: vec![
                            TagSpec::new("speed", 3.0, 7.0).with_unit("m/s"),
                            TagSpec::new("temperature", 20.0, 90.0).with_unit("C"),
                            TagSpec::new("pressure", 1.0, 5.0).with_unit("bar"),
                        ],
                    },
                    MachineSpec {
                        name: "Machine2".to_string(),
                        tags: vec![
                            TagSpec::new("rpm", 800.0, 1500.0).with_unit("rpm"),
                            TagSpec::new("torque", 10.0, 30.0).with_unit("Nm"),
                        ],
                    },
                ],
            },
            LineSpec {
                name: "Line2".to_string(),
                machines: vec![
                    MachineSpec {
                        name: "Machine3".to_string(),
                        tags: vec![
                            TagSpec::new("flow_rate", 50.0, 120.0).with_unit("L/min"),
                            TagSpec::new("vibration", 0.1, 5.0).with_unit("mm/s"),
                        ],
                    },
                    MachineSpec {
                        name: "Machine4".to_string(),
                        tags: vec![
                            TagSpec::new("humidity", 10.0, 50.0).with_unit("%"),
                            TagSpec::new("temperature", 25.0, 80.0).with_unit("C"),
                        ],
                    },
                ],
            },
        ],
    }
}
