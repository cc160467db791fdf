extern crate path_spline;

use path_spline::{Spline, Waypoint};

fn main() {

    let waypoints = vec![
        Waypoint::new(0.0, 0.0, 0.0),
        Waypoint::new(1.0, 0.5, 0.5),
        Waypoint::new(1.5, 2.0, 1.5),
        Waypoint::new(3.0, 2.5, 2.0),
        Waypoint::new(4.0, 4.0, 3.5),
    ];

    let spline = Spline::new(waypoints).unwrap();

    let number_of_steps = 35;
    let step = (spline.end_time() - spline.start_time()) / number_of_steps as f64;

    let t_vector: Vec<f64> = (0..=number_of_steps)
        .map(|i| (spline.start_time() + step * i as f64).min(spline.end_time()))
        .collect();

    let result = spline.batch_sample(&t_vector).unwrap();

    println!("t;x;y;speed");
    for sample in result {
        let speed = sample.velocity_x.hypot(sample.velocity_y);
        println!("{:.2};{:.3};{:.3};{:.3}", sample.t, sample.x, sample.y, speed);
    }
}
