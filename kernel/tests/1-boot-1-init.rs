#![deny(warnings)]

use rstest::rstest;

use kernel::{
    Config,
    Kernel,
    error::Error,
    hal::{
        Level,
        Trap,
    },
    process::{
        Pid,
        Queue,
        State,
    },
};
use ku::Syscall;

use machine::{
    Machine,
    Op,
    Sim,
    TIMES_ADDRESS,
};

mod log;
mod machine;

#[rstest]
fn boot() {
    let sim = Sim::new();
    let machine = sim.machine();

    assert_eq!(machine.installed, Trap::ALL);
    assert!(machine.interrupt_controller);
    assert_eq!(machine.clock, Some(100));
    assert!(machine.keyboard);
    assert_eq!(machine.level, Level::Open);

    let init = Pid::new(0);
    assert_eq!(sim.current(), init);
    assert_eq!(sim.kernel.state(init), State::Ready);
    assert_eq!(sim.kernel.queue(Queue::Ready), [init]);
    assert!(sim.kernel.queue(Queue::Blocked).is_empty());
    assert_eq!(sim.kernel.process(init).unwrap().program(), "init");

    assert_eq!(
        machine.ops,
        [Op::Switch {
            save: false,
            to: "init".to_string(),
        }],
    );
    assert_eq!(machine.images, 1);
    assert_eq!(machine.stacks, 1);
    assert_eq!(sim.kernel.ticks(), 0);
}

#[rstest]
#[should_panic(expected = "fatal: failed to create the first process")]
fn no_init_program() {
    Sim::boot_with(Config::default(), &["a"]);
}

#[rstest]
#[case::no_slots(Config { process_slots: 0, ..Config::default() })]
#[case::too_many_slots(Config { process_slots: 65, ..Config::default() })]
#[case::no_quantum(Config { quantum: 0, ..Config::default() })]
#[case::no_clock(Config { ticks_per_second: 0, ..Config::default() })]
#[case::no_init(Config { init_program: "", ..Config::default() })]
#[should_panic(expected = "fatal: invalid kernel configuration")]
fn invalid_config(#[case] config: Config) {
    Kernel::boot(Machine::new(&Sim::PROGRAMS), config);
}

#[rstest]
fn getpid() {
    let mut sim = Sim::new();
    assert_eq!(sim.call(Syscall::GetPid, &[]), Ok(0));

    let a = sim.spawn("a");
    sim.run_until(a);
    assert_eq!(sim.call(Syscall::GetPid, &[]), Ok(a.into_usize()));
}

#[rstest]
#[case::short(5)]
#[case::chunked(200)]
fn write(#[case] len: usize) {
    let mut sim = Sim::new();

    let text: String = (0 .. len).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
    let address = sim.string(&text);

    assert_eq!(sim.call(Syscall::Write, &[address, len]), Ok(0));
    assert_eq!(sim.machine().console, text.as_bytes());

    assert_eq!(sim.call(Syscall::Write, &[address, 0]), Ok(0));
    assert_eq!(sim.machine().console.len(), len);
}

#[rstest]
fn write_overflow() {
    let mut sim = Sim::new();
    assert_eq!(sim.call(Syscall::Write, &[usize::MAX, 2]), Err(Error::InvalidArgument));
    assert_eq!(sim.current(), Pid::new(0));
}

#[rstest]
fn times() {
    let mut sim = Sim::new();
    sim.ticks(5);

    let (ticks, times) = sim.times();
    assert_eq!(ticks, 5);
    assert_eq!(times.user, 5);
    assert_eq!(times.system, 0);

    sim.machine_mut().memory[TIMES_ADDRESS] = 0xAA;
    assert_eq!(sim.call(Syscall::Times, &[0]), Ok(5));
    assert_eq!(sim.machine().memory[TIMES_ADDRESS], 0xAA);
}

#[rstest]
#[case::unregistered(Syscall::COUNT)]
#[case::huge(usize::MAX / 2)]
fn invalid_syscall(#[case] number: usize) {
    let mut sim = Sim::new();

    assert_eq!(sim.raw_syscall(number, &[1, 2]), Some(Err(Error::InvalidSyscall)));
    assert_eq!(sim.kernel.queue(Queue::Ready), [Pid::new(0)]);
    assert_eq!(sim.kernel.trap_stats()[Trap::Syscall].count(), 1);
}

#[rstest]
fn trap_stats() {
    let mut sim = Sim::new();
    sim.ticks(25);
    sim.key(b'x');
    sim.call(Syscall::GetPid, &[]).unwrap();

    let stats = sim.kernel.trap_stats();
    assert_eq!(stats[Trap::Clock].count(), 25);
    assert_eq!(stats[Trap::Software].count(), 2);
    assert_eq!(stats[Trap::Terminal].count(), 1);
    assert_eq!(stats[Trap::Syscall].count(), 1);
    assert_eq!(stats[Trap::ArithmeticException].count(), 0);
}
