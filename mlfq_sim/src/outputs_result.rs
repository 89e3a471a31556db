use lib::output_log::append_info_to_yaml;
use serde_derive::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
struct ResultInfo {
    schedule_length: i32,
    finished_processes: usize,
    completed: bool,
}

pub fn dump_mlfq_result_to_file(
    file_path: &str,
    schedule_length: i32,
    finished_processes: usize,
    completed: bool,
) {
    let result_info = ResultInfo {
        schedule_length,
        finished_processes,
        completed,
    };
    let yaml =
        serde_yaml::to_string(&result_info).expect("Failed to serialize mlfq result to YAML");

    append_info_to_yaml(file_path, &yaml);
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib::{
        kernel::{Kernel, KernelConfig},
        output_log::create_yaml_file,
        process::ProcessRecord,
    };
    use std::fs::remove_file;

    #[test]
    fn test_dump_mlfq_result_to_file_normal() {
        let mut kernel = Kernel::new(KernelConfig::new(3, vec![1, 2, 4], 5, 1, 1024, 64, 32));
        kernel.add_process(ProcessRecord::new(1, 0, 2, 0));

        while !kernel.is_complete() {
            kernel.step();
        }

        let file_path = create_yaml_file("../outputs", "test_dump_mlfq_result_to_file_normal");
        dump_mlfq_result_to_file(
            &file_path,
            kernel.clock(),
            kernel.statistics().finished_processes,
            kernel.is_complete(),
        );

        let file_contents = std::fs::read_to_string(&file_path).unwrap();
        let result_info: ResultInfo = serde_yaml::from_str(&file_contents).unwrap();

        assert_eq!(result_info.schedule_length, 2);
        assert_eq!(result_info.finished_processes, 1);
        assert!(result_info.completed);

        remove_file(file_path).unwrap();
    }
}
