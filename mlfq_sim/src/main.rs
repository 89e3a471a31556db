mod outputs_result;

use clap::Parser;
use lib::kernel::Kernel;
use lib::output_log::create_scheduler_log_yaml_file;
use lib::stats::{GanttLog, MemoryEventLog};
use lib::workload::create_workload_from_yaml;
use log::warn;
use outputs_result::dump_mlfq_result_to_file;

#[derive(Parser)]
#[clap(
    name = "MLFQ_Simulator",
    version = "1.0",
    about = "About:
    Discrete-time simulation of a multi-level feedback queue scheduler
    with aging, multi-core dispatch and demand-paged memory with swap."
)]
struct ArgParser {
    ///Path to workload YAML file.
    #[clap(short = 'f', long = "workload_file_path", required = true)]
    workload_file_path: String,
    ///Number of processing cores (overrides the workload file).
    #[clap(short = 'c', long = "number_of_cores")]
    number_of_cores: Option<usize>,
    ///Path to output directory.
    #[clap(short = 'o', long = "output_dir_path", default_value = "../outputs")]
    output_dir_path: String,
    ///Maximum number of ticks before the run is aborted. Guards workloads
    ///whose memory demand can never be satisfied.
    #[clap(short = 't', long = "tick_limit", default_value = "100000")]
    tick_limit: i32,
}

fn main() {
    env_logger::init();
    let arg: ArgParser = ArgParser::parse();
    let workload = create_workload_from_yaml(&arg.workload_file_path);

    let mut config = workload.kernel.clone();
    if let Some(number_of_cores) = arg.number_of_cores {
        config.set_num_cores(number_of_cores);
    }

    let mut kernel = Kernel::new(config);
    for record in workload.process_records() {
        kernel.add_process(record);
    }
    kernel.initialize();

    while !kernel.is_complete() && kernel.clock() < arg.tick_limit {
        kernel.step();
    }
    if !kernel.is_complete() {
        warn!(
            "tick limit {} reached before every process terminated",
            arg.tick_limit
        );
    }

    let file_path = create_scheduler_log_yaml_file(&arg.output_dir_path, "mlfq");
    let statistics = kernel.statistics();

    dump_mlfq_result_to_file(
        &file_path,
        kernel.clock(),
        statistics.finished_processes,
        kernel.is_complete(),
    );
    kernel.simulation_info().dump_simulation_info_to_yaml(&file_path);
    statistics.dump_scheduler_stats_to_yaml(&file_path);
    kernel.process_set_log().dump_process_set_log_to_yaml(&file_path);
    let gantt_log = GanttLog {
        entries: kernel.gantt_log().to_vec(),
    };
    gantt_log.dump_gantt_log_to_yaml(&file_path);
    let memory_event_log = MemoryEventLog {
        events: kernel.memory_events().to_vec(),
    };
    memory_event_log.dump_memory_event_log_to_yaml(&file_path);
}
