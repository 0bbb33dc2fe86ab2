#[cfg(test)]
mod test {
  use std::env;
  use std::fs;
  use std::time::Duration;

  use mica::{Parser, State};
  use tracing_subscriber::EnvFilter;
  use mica_benchmarks::{
    fixtures, format_number, iterations, load_fixtures, run, select_fixtures, verify, Driver, Fixture, Measurement,
    DEFAULT_LOG_FILTER, FIXTURE_NAMES,
  };

  #[test]
  fn fixtures_are_well_formed() {
    let fixtures = fixtures();
    let names: Vec<_> = fixtures.iter().map(|fixture| fixture.name.as_str()).collect();
    assert_eq!(names, FIXTURE_NAMES);

    let seanmonstar = &fixtures[0].payload;
    assert!(seanmonstar.starts_with(b"GET /wp-content/uploads/2010/03/hello-kitty-darth-vader-pink.jpg HTTP/1.1\r\n"));
    assert!(seanmonstar.ends_with(b"utmcmd=referral\r\n\r\n"));

    let nodejs = &fixtures[1].payload;
    assert!(nodejs.ends_with(b"\r\n\r\nb\r\nhello world\r\n0\r\n\r\n"));
    // Every LF belongs to a CRLF
    assert!(nodejs.windows(2).all(|pair| pair[1] != b'\n' || pair[0] == b'\r'));

    let undici = &fixtures[2].payload;
    assert!(undici.starts_with(b"HTTP/1.1 200 OK\r\n"));
    assert!(undici.ends_with(&[b'-'; 65535]));
    assert!(!undici.ends_with(&[b'-'; 65536]));
  }

  #[test]
  fn fixtures_are_parsed_entirely() {
    for fixture in fixtures() {
      let mut parser = Parser::new();

      for _ in 0..5 {
        assert_eq!(parser.parse(&fixture.payload), fixture.payload.len(), "{}", fixture.name);
        assert_eq!(parser.state, State::Start, "{}", fixture.name);
      }
    }
  }

  #[test]
  fn fixtures_pass_verification() {
    for fixture in fixtures() {
      assert!(verify(&fixture, Driver::Native).is_ok(), "{}", fixture.name);
      assert!(verify(&fixture, Driver::Abi).is_ok(), "{}", fixture.name);
    }
  }

  #[test]
  fn verification_rejects_broken_samples() {
    let broken = Fixture::new("broken", b"GET / HTTP/1.1\r\nBad Header: x\r\n\r\n".to_vec());
    let error = verify(&broken, Driver::Native).unwrap_err();
    assert_eq!(error.to_string(), "sample broken cannot be parsed");

    let partial = Fixture::new("partial", b"GET / HTTP/1.1\r\nHost".to_vec());
    assert!(verify(&partial, Driver::Native).is_err());
    assert!(verify(&partial, Driver::Abi).is_err());
  }

  #[test]
  fn sample_selection() {
    let selected = select_fixtures(fixtures(), &[String::from("undici"), String::from("seanmonstar_httparse")]).unwrap();
    let names: Vec<_> = selected.iter().map(|fixture| fixture.name.as_str()).collect();
    assert_eq!(names, ["undici", "seanmonstar_httparse"]);

    assert_eq!(select_fixtures(fixtures(), &[]).unwrap().len(), 3);
    assert!(select_fixtures(fixtures(), &[String::from("llhttp")]).is_err());
  }

  #[test]
  fn loading_fixtures_from_a_directory() {
    let dir = env::temp_dir().join(format!("mica-fixtures-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();

    for name in FIXTURE_NAMES {
      fs::write(dir.join(format!("{}.txt", name)), "GET / HTTP/1.1\\r\\n\nHost: localhost\\r\\n\\r\\n\n").unwrap();
    }

    let loaded = load_fixtures(&dir).unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded[2].payload, b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n");

    fs::remove_dir_all(&dir).unwrap();
    assert!(load_fixtures(&dir).is_err());
  }

  #[test]
  fn iterations_use_integer_division() {
    assert_eq!(iterations(1000, 1 << 33), 8_589_934);
    assert_eq!(iterations(3, 10), 3);
    assert_eq!(iterations(20, 10), 0);
    assert_eq!(iterations(0, 10), 0);
  }

  #[test]
  fn measurement_arithmetic() {
    let measurement = Measurement {
      name: String::from("sample"),
      iterations: 1000,
      payload_len: 2048,
      elapsed: Duration::from_secs(2),
    };

    assert_eq!(measurement.total_bytes(), 2_048_000);
    assert_eq!(measurement.bandwidth(), 1_024_000.0);
    assert_eq!(measurement.ops_per_sec(), 500.0);
    assert_eq!(
      measurement.to_string(),
      "               sample |        1_000 samples |     1.95 MB |       0.98 MB/s |     500.00 ops/sec |   2.00 s"
    );
  }

  #[test]
  fn number_formatting() {
    assert_eq!(format_number(0.0, 0), "0");
    assert_eq!(format_number(999.0, 0), "999");
    assert_eq!(format_number(1000.0, 0), "1_000");
    assert_eq!(format_number(8_589_934.0, 0), "8_589_934");
    assert_eq!(format_number(1234567.891, 2), "1_234_567.89");
    assert_eq!(format_number(1234.5, 3), "1_234.500");
    assert_eq!(format_number(-1234.0, 1), "-1_234.0");

    // The grouping expression is shared between calls
    for _ in 0..3 {
      assert_eq!(format_number(65535.0, 2), "65_535.00");
    }
  }

  #[test]
  fn default_log_filter_covers_the_library() {
    assert!(DEFAULT_LOG_FILTER.parse::<EnvFilter>().is_ok());

    let targets: Vec<_> = DEFAULT_LOG_FILTER.split(',').collect();
    assert_eq!(targets, ["mica_bench=info", "mica_benchmarks=info"]);
  }

  #[test]
  fn small_runs() {
    for driver in [Driver::Native, Driver::Abi] {
      for fixture in fixtures() {
        let measurement = run(&fixture, driver, fixture.payload.len() * 4);

        assert_eq!(measurement.name, fixture.name);
        assert_eq!(measurement.iterations, 4);
        assert_eq!(measurement.total_bytes(), fixture.payload.len() * 4);
      }
    }
  }
}
